//! Set reconciliation: the minimal writes that make persisted identifiers
//! equal the snapshot's identifiers.

use std::collections::HashSet;
use std::hash::Hash;

/// A record addressable by a stable identifier.
pub trait Keyed {
    type Key: Eq + Hash + Ord + Clone;

    fn key(&self) -> &Self::Key;
}

/// Writes needed to converge persisted state on a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan<K, R> {
    /// Every snapshot record, to be written unconditionally (the source is
    /// authoritative).
    pub upserts: Vec<R>,
    /// Persisted identifiers absent from the snapshot, sorted.
    pub deletes: Vec<K>,
}

impl<K, R> ReconcilePlan<K, R> {
    pub fn is_noop(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Plan the inserts/updates and deletes for `desired` given the identifiers
/// currently persisted.
///
/// Duplicate keys in `desired` collapse to the last occurrence.
pub fn plan<R, I>(current_ids: I, desired: Vec<R>) -> ReconcilePlan<R::Key, R>
where
    R: Keyed,
    I: IntoIterator<Item = R::Key>,
{
    let mut seen: HashSet<R::Key> = HashSet::with_capacity(desired.len());
    let mut upserts: Vec<R> = Vec::with_capacity(desired.len());
    for record in desired.into_iter().rev() {
        if seen.insert(record.key().clone()) {
            upserts.push(record);
        }
    }
    upserts.reverse();

    let mut deletes: Vec<R::Key> = current_ids
        .into_iter()
        .filter(|id| !seen.contains(id))
        .collect();
    deletes.sort();
    deletes.dedup();

    ReconcilePlan { upserts, deletes }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
