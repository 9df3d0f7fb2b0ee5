use std::path::Path;

use crate::error::BenchError;

/// True for entries that produce no query: blank or `#` comment lines.
pub fn is_skipped(entry: &str) -> bool {
	let trimmed = entry.trim();
	trimmed.is_empty() || trimmed.starts_with('#')
}

/// Read domains from a UTF-8 file, one per line.
///
/// Blank lines and lines starting with '#' are skipped.
pub fn read_domain_file(path: &Path) -> Result<Vec<String>, BenchError> {
	let content = std::fs::read_to_string(path)
		.map_err(|source| BenchError::DomainList { path: path.to_path_buf(), source })?;
	Ok(parse_domain_list(&content))
}

fn parse_domain_list(content: &str) -> Vec<String> {
	content.lines()
		.filter(|line| !is_skipped(line))
		.map(|line| line.trim().to_string())
		.collect()
}
