use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use hickory_proto::rr::RecordType;

use crate::resolver::parse_record_type;

/// Measure DNS resolution time against a single resolver and record every query to CSV
#[derive(Parser, Debug)]
#[command(name = "rpz-dns-bench")]
#[command(about = "Benchmark DNS resolution times against a specific resolver")]
pub struct Cli {
	/// DNS server IP address
	#[arg(long = "server", default_value = "127.0.0.1")]
	pub server: IpAddr,

	/// DNS server port
	#[arg(long = "port", default_value = "53")]
	pub port: u16,

	/// Timeout and lifetime in seconds per query
	#[arg(long = "timeout", default_value = "3.0")]
	pub timeout: f64,

	/// Record types to query for every domain (e.g. A AAAA)
	#[arg(long = "qtypes", num_args = 1.., default_value = "A", value_parser = parse_record_type)]
	pub qtypes: Vec<RecordType>,

	/// Input file with one domain per line
	#[arg(long = "domains", default_value = "domains.txt")]
	pub domains: PathBuf,

	/// Output CSV path
	#[arg(long = "outfile")]
	pub outfile: PathBuf,

	/// Run label embedded in every row (e.g. rpz_on or rpz_off)
	#[arg(long = "label", default_value = "")]
	pub label: String,

	/// Log verbosity (RUST_LOG overrides)
	#[arg(long = "log-level", value_enum, default_value = "warn")]
	pub log_level: LogLevel,
}

/// Logging level for the run
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
	Error,
	Warn,
	Info,
	Debug,
	Trace,
}

impl From<LogLevel> for log::LevelFilter {
	fn from(level: LogLevel) -> Self {
		match level {
			LogLevel::Error => log::LevelFilter::Error,
			LogLevel::Warn => log::LevelFilter::Warn,
			LogLevel::Info => log::LevelFilter::Info,
			LogLevel::Debug => log::LevelFilter::Debug,
			LogLevel::Trace => log::LevelFilter::Trace,
		}
	}
}
