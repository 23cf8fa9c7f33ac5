//! Message framing for the ROLI block protocol.
//!
//! Bodies built here exclude the transport-level `F0`/`F7` delimiters; `wrap`
//! and `unwrap` add and strip them for transports that deal in raw SysEx.

use crate::bits::Payload;
use crate::topology::TopologyId;

pub const SYSEX_START: u8 = 0xf0;
pub const SYSEX_END: u8 = 0xf7;

/// ROLI manufacturer id followed by the device family.
pub const HEADER: [u8; 3] = [0x00, 0x21, 0x10];

const SERIAL_REQUEST: [u8; 2] = [0x78, 0x3f];
const TOPOLOGY_RESET: [u8; 6] = [0x77, 0x00, 0x01, 0x01, 0x00, 0x5d];

/// Length of a framed block command: header, topology, payload, checksum.
pub const COMMAND_FRAME_LEN: usize = HEADER.len() + 1 + 8 + 1;

/// Device side sanity check over a payload. Always 7-bit clean.
pub fn checksum(bytes: &[u8]) -> u8 {
    let mut sum = bytes.len() as u8;
    for b in bytes {
        sum = sum.wrapping_mul(3).wrapping_add(*b);
    }
    sum & 0x7f
}

pub fn frame_command(topology: TopologyId, payload: &Payload) -> Vec<u8> {
    let mut msg = Vec::with_capacity(COMMAND_FRAME_LEN);
    msg.extend_from_slice(&HEADER);
    msg.push(topology.into());
    msg.extend_from_slice(payload);
    msg.push(checksum(payload));
    msg
}

pub fn frame_serial_request() -> Vec<u8> {
    [&HEADER[..], &SERIAL_REQUEST[..]].concat()
}

pub fn frame_topology_reset() -> Vec<u8> {
    [&HEADER[..], &TOPOLOGY_RESET[..]].concat()
}

/// Add SysEx start and end delimiters.
pub fn wrap(body: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(body.len() + 2);
    v.push(SYSEX_START);
    v.extend_from_slice(body);
    v.push(SYSEX_END);
    v
}

/// Strip delimiters and header from a raw inbound SysEx message.
/// Returns `None` for anything that is not a ROLI SysEx.
pub fn unwrap(message: &[u8]) -> Option<&[u8]> {
    let len = message.len();
    if len < HEADER.len() + 2 || message[0] != SYSEX_START || message[len - 1] != SYSEX_END {
        return None;
    }
    let inner = &message[1..len - 1];
    if inner.starts_with(&HEADER) {
        Some(&inner[HEADER.len()..])
    } else {
        None
    }
}

/// Space separated upper case hex, as printed in the OUT / IN logs.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}
