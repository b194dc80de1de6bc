//! Scanner presence tracking.
//!
//! The hub announces scanners with `attached`/`detached` messages and sends a
//! full `scanner_list` snapshot on request. The roster folds both into one
//! map so the station can tell which scanners are reachable.

use std::collections::BTreeMap;

use labelcheck_core::ScannerId;
use labelcheck_protocol::ScannerInfo;

/// Last known state of one scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerEntry {
    /// Status string reported by the hub (`attached` when only announced).
    pub status: String,
}

/// Scanners currently known to the hub, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct ScannerRoster {
    scanners: BTreeMap<ScannerId, ScannerEntry>,
}

impl ScannerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an `attached` message. Returns `true` if the scanner is new.
    pub fn attach(&mut self, scanner_id: ScannerId) -> bool {
        self.scanners
            .insert(
                scanner_id,
                ScannerEntry {
                    status: "attached".to_string(),
                },
            )
            .is_none()
    }

    /// Record a `detached` message. Returns `true` if the scanner was known.
    pub fn detach(&mut self, scanner_id: ScannerId) -> bool {
        self.scanners.remove(&scanner_id).is_some()
    }

    /// Replace the roster with a `scanner_list` snapshot.
    pub fn replace(&mut self, scanners: &[ScannerInfo]) {
        self.scanners = scanners
            .iter()
            .map(|info| {
                (
                    info.scanner_id,
                    ScannerEntry {
                        status: info.status.clone(),
                    },
                )
            })
            .collect();
    }

    pub fn contains(&self, scanner_id: ScannerId) -> bool {
        self.scanners.contains_key(&scanner_id)
    }

    pub fn get(&self, scanner_id: ScannerId) -> Option<&ScannerEntry> {
        self.scanners.get(&scanner_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ScannerId> + '_ {
        self.scanners.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_detach() {
        let mut roster = ScannerRoster::new();

        assert!(roster.attach(ScannerId::new(2)));
        assert!(!roster.attach(ScannerId::new(2)));
        assert!(roster.contains(ScannerId::new(2)));
        assert_eq!(roster.get(ScannerId::new(2)).unwrap().status, "attached");

        assert!(roster.detach(ScannerId::new(2)));
        assert!(!roster.detach(ScannerId::new(2)));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_snapshot_replaces_roster() {
        let mut roster = ScannerRoster::new();
        roster.attach(ScannerId::new(9));

        roster.replace(&[
            ScannerInfo {
                scanner_id: ScannerId::new(3),
                status: "ready".to_string(),
            },
            ScannerInfo {
                scanner_id: ScannerId::new(1),
                status: "busy".to_string(),
            },
        ]);

        let ids: Vec<u32> = roster.ids().map(|id| id.as_u32()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(!roster.contains(ScannerId::new(9)));
        assert_eq!(roster.get(ScannerId::new(1)).unwrap().status, "busy");
    }
}
