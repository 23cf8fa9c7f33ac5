//! SysEx codec for ROLI LUMI Keys blocks.
//!
//! Control commands (color, scale, octave, ...) are packed into 8-byte
//! payloads of 7-bit groups, framed with the ROLI header, a block selector and
//! a checksum. Inbound block announcements are decoded into topology ids.
//!
//! ```
//! use lumi_sysex::{command, topology::TopologyId};
//!
//! let msg = command::encode_frame(TopologyId::ALL, "scale", "Dorian").unwrap();
//! assert_eq!(msg.len(), 13);
//! ```

#[macro_use]
extern crate lazy_static;

pub mod bits;
pub mod command;
pub mod config;
pub mod error;
pub mod midi;
pub mod sysex;
pub mod topology;

pub use command::{encode, encode_frame, Value};
pub use error::{CodecError, ErrorKind};
pub use topology::{DiscoveredTopologies, TopologyId};
