use std::path::PathBuf;

use thiserror::Error;

/// Failures that make a run's output meaningless; these abort the process.
#[derive(Error, Debug)]
pub enum BenchError {
	#[error("failed to read domain file '{}': {source}", path.display())]
	DomainList {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("failed to write output file '{}': {source}", path.display())]
	Output {
		path: PathBuf,
		source: csv::Error,
	},

	#[error("timeout must be a positive number of seconds, got {0}")]
	InvalidTimeout(f64),
}
