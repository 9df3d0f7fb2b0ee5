use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use hickory_proto::op::{Message, MessageType};
use hickory_proto::rr::RecordType;
use hickory_proto::ProtoError;
use log::{debug, info};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

use crate::dns::{build_query, canonicalize_name, classify_response, error_kind_name};
use crate::domains::is_skipped;
use crate::error::BenchError;
use crate::output::CsvSink;
use crate::transport::{MeasurementRecord, Outcome, RunMetadata, TargetConfig};

/// Large enough for EDNS-sized UDP replies
const UDP_BUFFER_SIZE: usize = 4096;

/// Deadline used when start + timeout is past what `Instant` can represent
const FAR_DEADLINE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Why an exchange with the target produced no usable reply
#[derive(Error, Debug)]
enum ExchangeError {
	#[error("no reply before the deadline")]
	Timeout,
	#[error("{0}")]
	Io(#[from] std::io::Error),
	#[error("malformed reply: {0}")]
	Malformed(ProtoError),
	#[error("reply does not match the query")]
	Unexpected,
	#[error("query of {0} bytes is too large for TCP framing")]
	TooLarge(usize),
}

/// Issues one query at a time to a single configured server.
pub struct ResolverClient {
	target: TargetConfig,
}

impl ResolverClient {
	pub fn new(target: TargetConfig) -> Self {
		ResolverClient { target }
	}

	pub fn target(&self) -> &TargetConfig {
		&self.target
	}

	/// Resolve one (domain, type) pair and measure it.
	///
	/// Returns None for blank or comment entries; every other input yields a
	/// record, whatever the outcome.
	pub async fn resolve(&self, domain: &str, record_type: RecordType) -> Option<MeasurementRecord> {
		if is_skipped(domain) {
			return None;
		}
		let qname = canonicalize_name(domain.trim());

		let ts_start = Utc::now();
		let start = Instant::now();
		let outcome = self.query(&qname, record_type, start).await;
		let end = Instant::now();
		let ts_end = Utc::now();

		let (status, rcode, error) = outcome.describe();
		let error = error.to_string();
		let answers = match outcome {
			Outcome::Answer { answers, .. } => answers,
			_ => Vec::new(),
		};

		Some(MeasurementRecord {
			timestamp_start_utc: ts_start.to_rfc3339_opts(SecondsFormat::Millis, true),
			timestamp_end_utc: ts_end.to_rfc3339_opts(SecondsFormat::Millis, true),
			domain: qname,
			query_type: record_type,
			elapsed: end - start,
			status,
			rcode,
			answers,
			error,
		})
	}

	/// Run a single resolution attempt bounded by the configured timeout.
	async fn query(&self, qname: &str, record_type: RecordType, start: Instant) -> Outcome {
		let start_at = tokio::time::Instant::from_std(start);
		let deadline = start_at.checked_add(self.target.timeout)
			.unwrap_or_else(|| start_at + FAR_DEADLINE);
		let server = self.target.addr();
		let txid: u16 = rand::random();

		let query_bytes = match build_query(qname, record_type, txid) {
			Ok(bytes) => bytes,
			Err(e) => {
				return Outcome::Other {
					kind: error_kind_name(&e),
					error: e.to_string(),
				};
			}
		};

		let mut result = self.exchange_udp(&query_bytes, txid, deadline).await;
		if matches!(&result, Ok(reply) if reply.truncated()) {
			debug!("{} {}: truncated UDP reply, repeating over TCP", qname, record_type);
			result = self.exchange_tcp(&query_bytes, txid, deadline).await;
		}

		match result {
			Ok(reply) => classify_response(&reply, qname, record_type, server),
			Err(ExchangeError::Timeout) => Outcome::Timeout {
				error: format!(
					"The resolution lifetime expired after {:.3} seconds: Server {} port {} did not answer",
					start.elapsed().as_secs_f64(), server.ip(), server.port(),
				),
			},
			Err(e) => Outcome::NoNameservers {
				error: format!(
					"All nameservers failed to answer the query {} IN {}: Server {} port {}: {}",
					qname, record_type, server.ip(), server.port(), e,
				),
			},
		}
	}

	/// Send the query over UDP and wait for the matching reply.
	///
	/// Stray datagrams with another id, or that are not responses, are
	/// dropped and the wait continues until the deadline.
	async fn exchange_udp(
		&self,
		query_bytes: &[u8],
		txid: u16,
		deadline: tokio::time::Instant,
	) -> Result<Message, ExchangeError> {
		let server = self.target.addr();
		let bind_addr = if server.is_ipv4() {
			"0.0.0.0:0"
		} else {
			"[::]:0"
		};
		let socket = UdpSocket::bind(bind_addr).await?;
		socket.connect(server).await?;
		within(deadline, socket.send(query_bytes)).await?;

		let mut buf = vec![0u8; UDP_BUFFER_SIZE];
		loop {
			let len = within(deadline, socket.recv(&mut buf)).await?;
			match Message::from_vec(&buf[..len]) {
				Ok(reply) if is_reply_to(&reply, txid) => return Ok(reply),
				Ok(reply) => {
					debug!("ignoring unexpected datagram from {} (id {})", server, reply.id());
				}
				Err(e) => return Err(ExchangeError::Malformed(e)),
			}
		}
	}

	/// Repeat the query over TCP with two-byte length framing.
	async fn exchange_tcp(
		&self,
		query_bytes: &[u8],
		txid: u16,
		deadline: tokio::time::Instant,
	) -> Result<Message, ExchangeError> {
		let length = u16::try_from(query_bytes.len())
			.map_err(|_| ExchangeError::TooLarge(query_bytes.len()))?;
		let mut framed = Vec::with_capacity(query_bytes.len() + 2);
		framed.extend_from_slice(&length.to_be_bytes());
		framed.extend_from_slice(query_bytes);

		let mut stream = within(deadline, TcpStream::connect(self.target.addr())).await?;
		within(deadline, stream.write_all(&framed)).await?;

		let mut length_buf = [0u8; 2];
		within(deadline, stream.read_exact(&mut length_buf)).await?;
		let mut body = vec![0u8; u16::from_be_bytes(length_buf) as usize];
		within(deadline, stream.read_exact(&mut body)).await?;

		let reply = Message::from_vec(&body).map_err(ExchangeError::Malformed)?;
		if !is_reply_to(&reply, txid) {
			return Err(ExchangeError::Unexpected);
		}
		Ok(reply)
	}
}

fn is_reply_to(reply: &Message, txid: u16) -> bool {
	reply.id() == txid && reply.message_type() == MessageType::Response
}

/// Await an I/O future, failing with `Timeout` once the deadline passes.
async fn within<F, T>(deadline: tokio::time::Instant, fut: F) -> Result<T, ExchangeError>
where
	F: Future<Output = std::io::Result<T>>,
{
	match tokio::time::timeout_at(deadline, fut).await {
		Ok(result) => Ok(result?),
		Err(_) => Err(ExchangeError::Timeout),
	}
}

/// Measure every (domain, query type) pair in order and write each result.
///
/// Domains form the outer loop and query types the inner one. Queries are
/// awaited one at a time so no measurement overlaps another. Skipped entries
/// are neither written nor counted. Returns the number of rows written.
pub async fn run_benchmark(
	client: &ResolverClient,
	domains: &[String],
	query_types: &[RecordType],
	meta: &RunMetadata,
	sink: &mut CsvSink,
) -> Result<usize, BenchError> {
	let server: SocketAddr = client.target().addr();
	info!(
		"Querying {} domains x {} types against {}",
		domains.len(), query_types.len(), server,
	);

	let mut written = 0;
	for domain in domains {
		for &record_type in query_types {
			let record = match client.resolve(domain, record_type).await {
				Some(record) => record,
				None => continue,
			};
			debug!(
				"{} {} {} {:.3} ms answers={} {}",
				record.domain, record.query_type, record.status,
				record.elapsed_ms(), record.answer_count(), record.error,
			);
			sink.write(&record, meta)?;
			written += 1;
		}
	}

	info!("Finished {} measurements", written);
	Ok(written)
}
