use celeris_dns_domain::{RecordType, ResolveError};
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType as WireRecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::IpAddr;
use std::str::FromStr;

/// Parsed upstream answer, reduced to what the resolver core consumes.
#[derive(Debug, Clone)]
pub(crate) struct WireResponse {
    pub addresses: Vec<IpAddr>,
    pub rcode: ResponseCode,
    pub authoritative: bool,
}

impl WireResponse {
    pub fn is_nxdomain(&self) -> bool {
        self.rcode == ResponseCode::NXDomain
    }

    pub fn is_server_error(&self) -> bool {
        matches!(
            self.rcode,
            ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp
        )
    }
}

fn to_wire_type(record_type: RecordType) -> WireRecordType {
    match record_type {
        RecordType::A => WireRecordType::A,
        RecordType::Aaaa => WireRecordType::AAAA,
    }
}

/// Builds a recursion-desired query and returns it with its message id.
pub(crate) fn build_query(
    hostname: &str,
    record_type: RecordType,
) -> Result<(u16, Vec<u8>), ResolveError> {
    let name = Name::from_str(hostname)
        .map_err(|e| ResolveError::InvalidHostname(format!("{}: {}", hostname, e)))?;

    let mut query = Query::new();
    query.set_name(name);
    query.set_query_type(to_wire_type(record_type));
    query.set_query_class(DNSClass::IN);

    let id = fastrand::u16(..);

    let mut message = Message::new();
    message.set_id(id);
    message.set_message_type(MessageType::Query);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);

    let mut edns = Edns::new();
    edns.set_max_payload(4096);
    edns.set_version(0);
    message.set_edns(edns);

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message
        .emit(&mut encoder)
        .map_err(|e| ResolveError::Transport(format!("failed to serialize query: {}", e)))?;

    Ok((id, buf))
}

/// Parses a raw response, extracting A/AAAA addresses, the response code and
/// the AA bit. The caller verifies the message id.
pub(crate) fn parse_response(bytes: &[u8], expected_id: u16) -> Result<WireResponse, ResolveError> {
    let message = Message::from_vec(bytes)
        .map_err(|e| ResolveError::Transport(format!("failed to parse response: {}", e)))?;

    if message.id() != expected_id {
        return Err(ResolveError::Transport("mismatched response id".to_string()));
    }

    let mut addresses = Vec::new();
    for record in message.answers() {
        match record.data() {
            Some(RData::A(a)) => addresses.push(IpAddr::V4(a.0)),
            Some(RData::AAAA(aaaa)) => addresses.push(IpAddr::V6(aaaa.0)),
            _ => {}
        }
    }

    Ok(WireResponse {
        addresses,
        rcode: message.response_code(),
        authoritative: message.authoritative(),
    })
}
