use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::BenchError;
use crate::transport::{MeasurementRecord, RunMetadata, TargetConfig};

/// Output columns, in file order
pub const COLUMNS: [&str; 14] = [
	"run_label", "timestamp_start_utc", "timestamp_end_utc",
	"domain", "qtype", "elapsed_ms", "status", "rcode",
	"answer_count", "answers", "error",
	"server", "port", "timeout_s",
];

/// Log a summary of the run configuration before queries start.
pub fn log_config_summary(
	target: &TargetConfig,
	meta: &RunMetadata,
	domain_count: usize,
	query_types: &[String],
	outfile: &Path,
) {
	info!("DNS benchmark configuration");
	info!("  Server:       {}", target.addr());
	info!("  Timeout:      {} ms", target.timeout.as_millis());
	info!("  Query types:  {}", query_types.join(" "));
	info!("  Domains:      {}", domain_count);
	info!("  Label:        {}", meta.label);
	info!("  Output:       {}", outfile.display());
}

/// CSV sink for measurement rows.
///
/// The header is written on creation, so a run that produces no rows still
/// leaves a well-formed file. Buffered rows are flushed when the sink is
/// dropped, including on early exit.
pub struct CsvSink {
	writer: csv::Writer<File>,
	path: PathBuf,
	rows: usize,
}

impl CsvSink {
	pub fn create(path: &Path) -> Result<Self, BenchError> {
		let mut writer = csv::Writer::from_path(path)
			.map_err(|source| output_error(path, source))?;
		writer.write_record(COLUMNS)
			.map_err(|source| output_error(path, source))?;
		Ok(CsvSink { writer, path: path.to_path_buf(), rows: 0 })
	}

	/// Append one measurement, stamped with the run metadata.
	pub fn write(&mut self, record: &MeasurementRecord, meta: &RunMetadata) -> Result<(), BenchError> {
		self.writer.write_record(format_row(record, meta))
			.map_err(|source| output_error(&self.path, source))?;
		self.rows += 1;
		Ok(())
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Flush everything to disk and return the number of rows written.
	pub fn finish(mut self) -> Result<usize, BenchError> {
		self.writer.flush()
			.map_err(|source| output_error(&self.path, csv::Error::from(source)))?;
		Ok(self.rows)
	}
}

fn output_error(path: &Path, source: csv::Error) -> BenchError {
	BenchError::Output { path: path.to_path_buf(), source }
}

fn format_row(record: &MeasurementRecord, meta: &RunMetadata) -> [String; 14] {
	[
		meta.label.clone(),
		record.timestamp_start_utc.clone(),
		record.timestamp_end_utc.clone(),
		record.domain.clone(),
		record.query_type.to_string(),
		format!("{:.3}", record.elapsed_ms()),
		record.status.clone(),
		record.rcode.clone(),
		record.answer_count().to_string(),
		record.answers.join(";"),
		record.error.clone(),
		meta.server.to_string(),
		meta.port.to_string(),
		format_seconds(meta.timeout_secs),
	]
}

/// Decimal seconds that always carry a fractional part, e.g. "3.0".
fn format_seconds(secs: f64) -> String {
	let text = secs.to_string();
	if text.contains('.') {
		text
	} else {
		format!("{}.0", text)
	}
}
