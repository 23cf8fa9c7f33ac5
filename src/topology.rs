use crate::error::{InvalidTopology, Result};
use snafu::ensure;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Mutex;

/// First body byte of a block announcement.
pub const ANNOUNCEMENT: u8 = 0x77;

const TOPOLOGY_MASK: u8 = 0x3f;

/// Short id of one chained keyboard block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopologyId(u8);

impl TopologyId {
    /// Addresses every connected block.
    pub const ALL: TopologyId = TopologyId(0);

    pub fn new(id: u8) -> Result<Self> {
        ensure!(id <= TOPOLOGY_MASK, InvalidTopology { id });
        Ok(TopologyId(id))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_broadcast(self) -> bool {
        self == TopologyId::ALL
    }
}

impl From<TopologyId> for u8 {
    fn from(id: TopologyId) -> u8 {
        id.0
    }
}

impl fmt::Display for TopologyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract the topology id from an inbound SysEx body (header already
/// stripped). Anything but a block announcement yields `None`.
pub fn decode_announcement(body: &[u8]) -> Option<TopologyId> {
    match body {
        [ANNOUNCEMENT, topology, ..] => Some(TopologyId(topology & TOPOLOGY_MASK)),
        _ => None,
    }
}

/// Blocks seen on the wire during this session. Only ever grows.
///
/// Inbound MIDI callbacks run on the transport's own thread, so the set sits
/// behind a mutex and is shared through an `Arc`.
#[derive(Debug)]
pub struct DiscoveredTopologies {
    ids: Mutex<BTreeSet<TopologyId>>,
}

impl Default for DiscoveredTopologies {
    fn default() -> Self {
        DiscoveredTopologies::new()
    }
}

impl DiscoveredTopologies {
    /// Starts out knowing only the broadcast id.
    pub fn new() -> Self {
        let mut ids = BTreeSet::new();
        ids.insert(TopologyId::ALL);
        DiscoveredTopologies {
            ids: Mutex::new(ids),
        }
    }

    /// Returns true if the id was not known yet.
    pub fn insert(&self, id: TopologyId) -> bool {
        match self.ids.lock() {
            Ok(mut ids) => ids.insert(id),
            Err(poisoned) => poisoned.into_inner().insert(id),
        }
    }

    /// Decode a SysEx body and record any announced block.
    pub fn observe(&self, body: &[u8]) -> Option<TopologyId> {
        let id = decode_announcement(body)?;
        if self.insert(id) {
            log::info!("discovered block {}", id);
        }
        Some(id)
    }

    pub fn contains(&self, id: TopologyId) -> bool {
        self.snapshot().contains(&id)
    }

    /// Known ids in ascending order.
    pub fn snapshot(&self) -> Vec<TopologyId> {
        let ids = match self.ids.lock() {
            Ok(ids) => ids,
            Err(poisoned) => poisoned.into_inner(),
        };
        ids.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn announcement_masks_to_six_bits() {
        assert_eq!(decode_announcement(&[0x77, 0x45]), Some(TopologyId(5)));
        assert_eq!(decode_announcement(&[0x77, 0x3f, 0x01]), Some(TopologyId(0x3f)));
        assert_eq!(decode_announcement(&[0x77, 0x40]), Some(TopologyId::ALL));
    }

    #[test]
    fn other_messages_are_ignored() {
        assert_eq!(decode_announcement(&[0x78, 0x3f]), None);
        assert_eq!(decode_announcement(&[0x77]), None);
        assert_eq!(decode_announcement(&[]), None);
    }

    #[test]
    fn topology_range_is_checked() {
        assert_eq!(TopologyId::new(63).unwrap().value(), 63);
        assert_eq!(
            TopologyId::new(64).unwrap_err(),
            CodecError::InvalidTopology { id: 64 }
        );
        assert!(TopologyId::ALL.is_broadcast());
    }

    #[test]
    fn discovered_set_grows_and_dedupes() {
        let found = DiscoveredTopologies::new();
        assert_eq!(found.snapshot(), vec![TopologyId::ALL]);
        assert_eq!(found.observe(&[0x77, 0x45]), Some(TopologyId(5)));
        assert_eq!(found.observe(&[0x77, 0x05]), Some(TopologyId(5)));
        assert_eq!(found.observe(&[0x10, 0x05]), None);
        assert_eq!(found.snapshot(), vec![TopologyId::ALL, TopologyId(5)]);
        assert!(!found.insert(TopologyId(5)));
        assert!(found.contains(TopologyId(5)));
    }

    #[test]
    fn concurrent_observers_share_one_set() {
        let found = Arc::new(DiscoveredTopologies::new());
        let handles: Vec<_> = (1..=8u8)
            .map(|id| {
                let found = Arc::clone(&found);
                thread::spawn(move || {
                    found.observe(&[0x77, id]);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(found.snapshot().len(), 9);
    }
}
