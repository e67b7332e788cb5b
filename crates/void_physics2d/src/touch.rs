//! Per-body ledger of contact-point counts against other bodies

use crate::body::BodyId;
use std::collections::HashMap;

/// Contact-point counts keyed by the other body.
///
/// Entries only exist while their count is above zero. The ledger only
/// records one side of a pair; keeping both sides equal is the job of
/// [`BodySet`](crate::body::BodySet).
#[derive(Debug, Clone, Default)]
pub struct TouchLedger {
    counts: HashMap<BodyId, u32>,
}

impl TouchLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one new contact point against `other`, returning the new count
    pub fn touch(&mut self, other: BodyId) -> u32 {
        let count = self.counts.entry(other).or_insert(0);
        *count += 1;
        *count
    }

    /// Forget one contact point against `other`, returning the new count.
    ///
    /// Untouching an absent pair is a bookkeeping bug: it panics in debug
    /// builds and leaves the ledger unchanged in release builds.
    pub fn untouch(&mut self, other: BodyId) -> u32 {
        match self.counts.get_mut(&other) {
            Some(count) if *count > 1 => {
                *count -= 1;
                *count
            }
            Some(_) => {
                self.counts.remove(&other);
                0
            }
            None => {
                debug_assert!(false, "untouch of {other:?} without a matching touch");
                0
            }
        }
    }

    /// Check if at least one contact point exists against `other`
    pub fn is_touching(&self, other: BodyId) -> bool {
        self.counts.contains_key(&other)
    }

    /// Raw contact-point count against `other`
    pub fn touch_count(&self, other: BodyId) -> u32 {
        self.counts.get(&other).copied().unwrap_or(0)
    }

    /// Bodies currently touched
    pub fn touching(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.counts.keys().copied()
    }

    /// Number of distinct bodies touched
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if nothing is touched
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Drop `other` entirely regardless of its count
    pub(crate) fn forget(&mut self, other: BodyId) {
        self.counts.remove(&other);
    }

    /// Empty the ledger, returning the partners that were touched
    pub(crate) fn take_partners(&mut self) -> Vec<BodyId> {
        self.counts.drain().map(|(other, _)| other).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier2d::data::Index;

    fn id(n: u32) -> BodyId {
        BodyId::from_raw(Index::from_raw_parts(n, 0))
    }

    #[test]
    fn test_counts_per_point() {
        let mut ledger = TouchLedger::new();
        assert_eq!(ledger.touch(id(1)), 1);
        assert_eq!(ledger.touch(id(1)), 2);
        assert_eq!(ledger.touch(id(2)), 1);

        assert!(ledger.is_touching(id(1)));
        assert_eq!(ledger.touch_count(id(1)), 2);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_untouch_removes_at_zero() {
        let mut ledger = TouchLedger::new();
        ledger.touch(id(1));
        ledger.touch(id(1));

        assert_eq!(ledger.untouch(id(1)), 1);
        assert!(ledger.is_touching(id(1)));
        assert_eq!(ledger.untouch(id(1)), 0);
        assert!(!ledger.is_touching(id(1)));
        assert!(ledger.is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "without a matching touch")]
    fn test_untouch_absent_panics_in_debug() {
        let mut ledger = TouchLedger::new();
        ledger.untouch(id(3));
    }

    #[test]
    fn test_take_partners_clears() {
        let mut ledger = TouchLedger::new();
        ledger.touch(id(1));
        ledger.touch(id(2));
        let mut partners = ledger.take_partners();
        partners.sort_by_key(|b| b.raw().into_raw_parts());
        assert_eq!(partners, vec![id(1), id(2)]);
        assert!(ledger.is_empty());
    }
}
