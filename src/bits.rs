use crate::error::{InvalidWidth, PayloadOverflow, Result};
use snafu::ensure;

/// Number of 7-bit groups in a command payload.
pub const PAYLOAD_LEN: usize = 8;

/// Widest single field accepted by `append`.
pub const MAX_FIELD_BITS: u32 = 32;

const GROUP_BITS: u32 = 7;
const GROUP_MASK: u64 = 0x7f;

pub type Payload = [u8; PAYLOAD_LEN];

/// Packs unsigned fields of any width into 7-bit SysEx data groups.
///
/// Fields are laid down least significant bit first and are not aligned to
/// group boundaries: a field picks up where the previous one stopped, sharing
/// the last group if it was not full.
#[derive(Debug, Default, Clone)]
pub struct BitAccumulator {
    groups: Vec<u8>,
    bits: u32,
}

impl BitAccumulator {
    pub fn new() -> Self {
        BitAccumulator {
            groups: Vec::with_capacity(PAYLOAD_LEN),
            bits: 0,
        }
    }

    /// Append the low `width` bits of `value`. Upper bits are discarded.
    pub fn append(&mut self, value: u32, width: u32) -> Result<&mut Self> {
        ensure!(width > 0 && width <= MAX_FIELD_BITS, InvalidWidth { width });
        let total = self.bits + width;
        ensure!(
            total <= PAYLOAD_LEN as u32 * GROUP_BITS,
            PayloadOverflow { bits: total }
        );

        let mut value = u64::from(value) & ((1u64 << width) - 1);
        let mut used = self.bits % GROUP_BITS;
        let mut packed = if used > 0 {
            self.groups.pop().map(u64::from).unwrap_or(0)
        } else {
            0
        };
        let mut remaining = width as i64;
        while remaining > 0 {
            packed |= (value << used) & GROUP_MASK;
            self.groups.push(packed as u8);
            remaining -= i64::from(GROUP_BITS - used);
            value >>= GROUP_BITS - used;
            packed = 0;
            used = 0;
        }
        self.bits = total;
        Ok(self)
    }

    /// Total bits appended so far.
    pub fn bit_count(&self) -> u32 {
        self.bits
    }

    /// Groups emitted so far, before padding.
    pub fn groups(&self) -> &[u8] {
        &self.groups
    }

    /// The canonical payload, zero padded to eight groups.
    pub fn get(&self) -> Payload {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..self.groups.len()].copy_from_slice(&self.groups);
        payload
    }
}
