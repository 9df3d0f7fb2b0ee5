use std::net::SocketAddr;

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RecordType};
use hickory_proto::ProtoError;
use log::debug;

use crate::transport::Outcome;

/// Build a recursive DNS query for an already canonical name.
///
/// Returns the serialized query bytes ready to send over UDP or TCP.
pub fn build_query(
	domain: &str,
	record_type: RecordType,
	txid: u16,
) -> Result<Vec<u8>, ProtoError> {
	let name = Name::from_ascii(domain)?;

	let mut message = Message::new();
	message.set_id(txid);
	message.set_message_type(MessageType::Query);
	message.set_op_code(OpCode::Query);
	message.set_recursion_desired(true);
	message.add_query(Query::query(name, record_type));

	message.to_vec()
}

/// Convert a name to its fully-qualified ASCII-compatible form.
///
/// Non-ASCII names are punycoded; a name that cannot be converted is kept
/// verbatim so one bad entry never stops a run.
pub fn canonicalize_name(raw: &str) -> String {
	let mut name = if raw.is_ascii() {
		raw.to_string()
	} else {
		match Name::from_utf8(raw) {
			Ok(name) => name.to_ascii(),
			Err(e) => {
				debug!("keeping '{}' verbatim, IDNA conversion failed: {}", raw, e);
				raw.to_string()
			}
		}
	};
	if !name.ends_with('.') {
		name.push('.');
	}
	name
}

/// Mnemonic text for a response code, numeric text for anything unnamed.
pub fn rcode_text(rcode: ResponseCode) -> String {
	let text = match rcode {
		ResponseCode::NoError => "NOERROR",
		ResponseCode::FormErr => "FORMERR",
		ResponseCode::ServFail => "SERVFAIL",
		ResponseCode::NXDomain => "NXDOMAIN",
		ResponseCode::NotImp => "NOTIMP",
		ResponseCode::Refused => "REFUSED",
		ResponseCode::YXDomain => "YXDOMAIN",
		ResponseCode::YXRRSet => "YXRRSET",
		ResponseCode::NXRRSet => "NXRRSET",
		ResponseCode::NotAuth => "NOTAUTH",
		ResponseCode::NotZone => "NOTZONE",
		other => return u16::from(other).to_string(),
	};
	text.to_string()
}

/// Name errors that hickory only reports as free-text messages
const MESSAGE_KINDS: [(&str, &str); 4] = [
	("Malformed label", "EMPTYLABEL"),
	("unrecognized char", "BADCHARACTER"),
	("escape", "BADESCAPE"),
	("too long", "NAMETOOLONG"),
];

/// Upper-cased kind name of a protocol error, e.g. `LABELBYTESTOOLONG`.
///
/// Errors that carry only a message are named after that message, falling
/// back to `INVALIDNAME` since queries are only ever rejected for their name.
pub fn error_kind_name(error: &ProtoError) -> String {
	let debug = format!("{:?}", error.kind());
	let kind: String = debug.chars()
		.take_while(|c| c.is_ascii_alphanumeric())
		.collect();
	match kind.as_str() {
		"" => "PROTOERROR".to_string(),
		"Msg" | "Message" => {
			let text = error.to_string();
			MESSAGE_KINDS.iter()
				.find(|(needle, _)| text.contains(*needle))
				.map(|(_, name)| name.to_string())
				.unwrap_or_else(|| "INVALIDNAME".to_string())
		}
		_ => kind.to_ascii_uppercase(),
	}
}

/// Classify a reply from the target into an outcome.
///
/// Only records of the requested type count as answers (any record for
/// `ANY`), so a bare CNAME chain without the requested data is `NoAnswer`.
pub fn classify_response(
	message: &Message,
	qname: &str,
	record_type: RecordType,
	server: SocketAddr,
) -> Outcome {
	match message.response_code() {
		ResponseCode::NoError => {
			let answers: Vec<String> = message.answers().iter()
				.filter(|r| record_type == RecordType::ANY || r.record_type() == record_type)
				.map(|r| r.data().to_string())
				.collect();
			if answers.is_empty() {
				Outcome::NoAnswer {
					error: format!(
						"The DNS response does not contain an answer to the question: {} IN {}",
						qname, record_type,
					),
				}
			} else {
				Outcome::Answer {
					rcode: ResponseCode::NoError,
					answers,
				}
			}
		}
		ResponseCode::NXDomain => Outcome::Nxdomain {
			rcode: ResponseCode::NXDomain,
			error: format!("The DNS query name does not exist: {}", qname),
		},
		other => Outcome::NoNameservers {
			error: format!(
				"All nameservers failed to answer the query {} IN {}: Server {} port {} answered {}",
				qname, record_type, server.ip(), server.port(), rcode_text(other),
			),
		},
	}
}

#[cfg(test)]
mod tests {
	use std::net::Ipv4Addr;

	use hickory_proto::rr::rdata::{A, CNAME};
	use hickory_proto::rr::{RData, Record};

	use super::*;

	fn server() -> SocketAddr {
		"127.0.0.1:53".parse().unwrap()
	}

	fn reply_to(qname: &str, record_type: RecordType) -> Message {
		let query_bytes = build_query(qname, record_type, 4242).unwrap();
		let mut reply = Message::from_vec(&query_bytes).unwrap();
		reply.set_message_type(MessageType::Response);
		reply
	}

	fn a_record(owner: &str, ip: Ipv4Addr) -> Record {
		Record::from_rdata(Name::from_ascii(owner).unwrap(), 300, RData::A(A::from(ip)))
	}

	#[test]
	fn test_build_query_carries_txid() {
		let bytes = build_query("example.com.", RecordType::AAAA, 5678).unwrap();
		assert!(bytes.len() >= 12);
		assert_eq!(bytes[0], (5678 >> 8) as u8);
		assert_eq!(bytes[1], (5678 & 0xff) as u8);

		let message = Message::from_vec(&bytes).unwrap();
		assert!(message.recursion_desired());
		assert_eq!(message.queries().len(), 1);
		assert_eq!(message.queries()[0].query_type(), RecordType::AAAA);
	}

	#[test]
	fn test_build_query_rejects_oversized_label() {
		let long = format!("{}.example.", "a".repeat(70));
		assert!(build_query(&long, RecordType::A, 1).is_err());
	}

	#[test]
	fn test_error_kind_name_is_upper_cased() {
		let long = format!("{}.example.", "a".repeat(70));
		let error = build_query(&long, RecordType::A, 1).unwrap_err();
		let kind = error_kind_name(&error);
		assert!(!kind.is_empty());
		assert_eq!(kind, kind.to_ascii_uppercase());
		assert!(kind.chars().all(|c| c.is_ascii_alphanumeric()));
	}

	#[test]
	fn test_empty_label_kind_name() {
		let error = build_query("a..b.", RecordType::A, 1).unwrap_err();
		assert_eq!(error_kind_name(&error), "EMPTYLABEL");
	}

	#[test]
	fn test_bad_character_kind_name() {
		let error = build_query("exa mple.com.", RecordType::A, 1).unwrap_err();
		assert_eq!(error_kind_name(&error), "BADCHARACTER");
	}

	#[test]
	fn test_message_kinds_never_report_msg() {
		for name in ["a..b.", "exa mple.com.", "bad\\", "..."] {
			if let Err(error) = build_query(name, RecordType::A, 1) {
				let kind = error_kind_name(&error);
				assert_ne!(kind, "MSG", "name {:?}", name);
				assert_ne!(kind, "MESSAGE", "name {:?}", name);
			}
		}
	}

	#[test]
	fn test_canonicalize_appends_root() {
		assert_eq!(canonicalize_name("example.com"), "example.com.");
		assert_eq!(canonicalize_name("example.com."), "example.com.");
	}

	#[test]
	fn test_canonicalize_punycodes_unicode() {
		assert_eq!(canonicalize_name("bücher.example"), "xn--bcher-kva.example.");
	}

	#[test]
	fn test_canonicalize_keeps_unconvertible_name() {
		let raw = format!("{}.example", "ü".repeat(80));
		assert_eq!(canonicalize_name(&raw), format!("{}.", raw));
	}

	#[test]
	fn test_rcode_text_mnemonics() {
		assert_eq!(rcode_text(ResponseCode::NoError), "NOERROR");
		assert_eq!(rcode_text(ResponseCode::NXDomain), "NXDOMAIN");
		assert_eq!(rcode_text(ResponseCode::ServFail), "SERVFAIL");
		assert_eq!(rcode_text(ResponseCode::Refused), "REFUSED");
	}

	#[test]
	fn test_classify_answer() {
		let mut reply = reply_to("good.example.", RecordType::A);
		reply.add_answer(a_record("good.example.", Ipv4Addr::new(192, 0, 2, 10)));
		reply.add_answer(a_record("good.example.", Ipv4Addr::new(192, 0, 2, 11)));

		let outcome = classify_response(&reply, "good.example.", RecordType::A, server());
		assert_eq!(outcome, Outcome::Answer {
			rcode: ResponseCode::NoError,
			answers: vec!["192.0.2.10".to_string(), "192.0.2.11".to_string()],
		});
	}

	#[test]
	fn test_classify_cname_without_data_is_no_answer() {
		let mut reply = reply_to("alias.example.", RecordType::A);
		let target = Name::from_ascii("target.example.").unwrap();
		reply.add_answer(Record::from_rdata(
			Name::from_ascii("alias.example.").unwrap(),
			300,
			RData::CNAME(CNAME(target)),
		));

		let outcome = classify_response(&reply, "alias.example.", RecordType::A, server());
		assert!(matches!(outcome, Outcome::NoAnswer { .. }));
	}

	#[test]
	fn test_classify_empty_answer() {
		let reply = reply_to("example.com.", RecordType::AAAA);
		match classify_response(&reply, "example.com.", RecordType::AAAA, server()) {
			Outcome::NoAnswer { error } => {
				assert!(error.contains("example.com. IN AAAA"), "unexpected error: {}", error);
			}
			other => panic!("expected NoAnswer, got {:?}", other),
		}
	}

	#[test]
	fn test_classify_nxdomain() {
		let mut reply = reply_to("bad.invalid.", RecordType::A);
		reply.set_response_code(ResponseCode::NXDomain);
		let outcome = classify_response(&reply, "bad.invalid.", RecordType::A, server());
		assert!(matches!(outcome, Outcome::Nxdomain { rcode: ResponseCode::NXDomain, .. }));
	}

	#[test]
	fn test_classify_servfail_is_no_nameservers() {
		let mut reply = reply_to("broken.example.", RecordType::A);
		reply.set_response_code(ResponseCode::ServFail);
		match classify_response(&reply, "broken.example.", RecordType::A, server()) {
			Outcome::NoNameservers { error } => assert!(error.ends_with("SERVFAIL")),
			other => panic!("expected NoNameservers, got {:?}", other),
		}
	}
}
