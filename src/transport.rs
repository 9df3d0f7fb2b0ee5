use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;

use crate::dns::rcode_text;

/// The one server every query of a run is sent to
#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
	pub server: IpAddr,
	pub port: u16,
	/// Per-attempt and overall deadline of a single resolution
	pub timeout: Duration,
	/// The timeout exactly as configured, in seconds
	pub timeout_secs: f64,
}

impl TargetConfig {
	pub fn addr(&self) -> SocketAddr {
		SocketAddr::new(self.server, self.port)
	}
}

/// Run label plus a snapshot of the target, stamped on every output row
#[derive(Debug, Clone)]
pub struct RunMetadata {
	pub label: String,
	pub server: IpAddr,
	pub port: u16,
	pub timeout_secs: f64,
}

impl RunMetadata {
	pub fn new(label: &str, target: &TargetConfig) -> Self {
		RunMetadata {
			label: label.to_string(),
			server: target.server,
			port: target.port,
			timeout_secs: target.timeout_secs,
		}
	}
}

/// How a single query ended.
///
/// `Answer` always carries at least one rendered record; an empty answer set
/// is reported as `NoAnswer`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
	Answer { rcode: ResponseCode, answers: Vec<String> },
	NoAnswer { error: String },
	Nxdomain { rcode: ResponseCode, error: String },
	Timeout { error: String },
	NoNameservers { error: String },
	/// Any other protocol failure, tagged with its upper-cased kind name
	Other { kind: String, error: String },
}

impl Outcome {
	/// Status text, response-code text and error text for the output row.
	pub fn describe(&self) -> (String, String, &str) {
		match self {
			Outcome::Answer { rcode, .. } => ("OK".to_string(), rcode_text(*rcode), ""),
			Outcome::NoAnswer { error } => mirrored("NOANSWER", error),
			Outcome::Nxdomain { rcode, error } => {
				("NXDOMAIN".to_string(), rcode_text(*rcode), error.as_str())
			}
			Outcome::Timeout { error } => mirrored("TIMEOUT", error),
			Outcome::NoNameservers { error } => mirrored("NONAMESERVERS", error),
			Outcome::Other { kind, error } => mirrored(kind, error),
		}
	}
}

fn mirrored<'a>(status: &str, error: &'a str) -> (String, String, &'a str) {
	(status.to_string(), status.to_string(), error)
}

/// Result of one (domain, query type) attempt
#[derive(Debug, Clone)]
pub struct MeasurementRecord {
	pub timestamp_start_utc: String,
	pub timestamp_end_utc: String,
	/// Fully-qualified, ASCII-compatible form of the queried name
	pub domain: String,
	pub query_type: RecordType,
	pub elapsed: Duration,
	pub status: String,
	pub rcode: String,
	pub answers: Vec<String>,
	pub error: String,
}

impl MeasurementRecord {
	pub fn elapsed_ms(&self) -> f64 {
		self.elapsed.as_secs_f64() * 1000.0
	}

	pub fn answer_count(&self) -> usize {
		self.answers.len()
	}
}
