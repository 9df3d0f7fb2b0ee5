use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use hickory_proto::rr::RecordType;

use crate::error::BenchError;
use crate::transport::TargetConfig;

/// Build the target configuration for a run.
///
/// The timeout is given in seconds. It must be representable as a
/// `Duration` and must not round down to zero.
pub fn target_config(server: IpAddr, port: u16, timeout_secs: f64) -> Result<TargetConfig, BenchError> {
	let timeout = Duration::try_from_secs_f64(timeout_secs)
		.map_err(|_| BenchError::InvalidTimeout(timeout_secs))?;
	if timeout.is_zero() {
		return Err(BenchError::InvalidTimeout(timeout_secs));
	}
	Ok(TargetConfig {
		server,
		port,
		timeout,
		timeout_secs,
	})
}

/// Parse a record type mnemonic such as "a" or "AAAA".
pub fn parse_record_type(input: &str) -> Result<RecordType, String> {
	let upper = input.trim().to_ascii_uppercase();
	match RecordType::from_str(&upper) {
		Ok(RecordType::Unknown(_)) | Err(_) => Err(format!("unknown record type '{}'", input)),
		Ok(record_type) => Ok(record_type),
	}
}
