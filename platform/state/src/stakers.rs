// Copyright (c) 2024-2026 The Meridian Foundation

use crate::chain::StakerIterator;
use mrd_core_types::{NodeId, SubnetId, TxId};
use mrd_platform_types::Staker;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

// Heap entry ordered by the staker sort key; `source` breaks ties so the
// heap order is total. Reversed comparisons turn std's max-heap into the
// min-heap the merge needs.
struct HeapEntry {
    staker: Staker,
    source: usize,
}

impl HeapEntry {
    fn key(&self) -> (u8, TxId, usize) {
        let (priority, tx_id) = self.staker.sort_key();
        (priority, tx_id, self.source)
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Merges a parent's deferred-validator stream with a diff's own puts,
/// suppressing entries the diff deleted.
///
/// Both streams are already sorted by `(priority, tx_id)`; a two-element
/// heap of stream heads yields the merged order without buffering either
/// stream.
pub struct MergedStakerIterator {
    heap: BinaryHeap<HeapEntry>,
    sources: Vec<StakerIterator>,
    deleted: BTreeSet<(SubnetId, NodeId)>,
}

impl MergedStakerIterator {
    /// Merge `streams`, dropping stakers whose identity is in `deleted`.
    pub fn new(streams: Vec<StakerIterator>, deleted: BTreeSet<(SubnetId, NodeId)>) -> Self {
        let mut merged = Self {
            heap: BinaryHeap::with_capacity(streams.len()),
            sources: streams,
            deleted,
        };
        for source in 0..merged.sources.len() {
            merged.refill(source);
        }
        merged
    }

    fn refill(&mut self, source: usize) {
        if let Some(staker) = self.sources[source].next() {
            self.heap.push(HeapEntry { staker, source });
        }
    }
}

impl Iterator for MergedStakerIterator {
    type Item = Staker;

    fn next(&mut self) -> Option<Staker> {
        loop {
            let entry = self.heap.pop()?;
            self.refill(entry.source);
            if !self.deleted.contains(&entry.staker.key()) {
                return Some(entry.staker);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrd_core_types::{Id, ShortId};

    fn staker(priority: u8, tx_byte: u8, node_byte: u8) -> Staker {
        Staker {
            tx_id: Id([tx_byte; 32]),
            subnet_id: Id::EMPTY,
            node_id: ShortId([node_byte; 20]),
            weight: 1,
            start_time: 0,
            end_time: 100,
            reward_address: ShortId([9; 20]),
            priority,
        }
    }

    fn boxed(stakers: Vec<Staker>) -> StakerIterator {
        Box::new(stakers.into_iter())
    }

    #[test]
    fn test_merge_orders_by_priority_then_tx_id() {
        let parent = boxed(vec![staker(0, 2, 1), staker(1, 1, 2)]);
        let own = boxed(vec![staker(0, 3, 3), staker(2, 0, 4)]);

        let merged: Vec<u8> = MergedStakerIterator::new(vec![parent, own], BTreeSet::new())
            .map(|s| s.priority)
            .collect();
        assert_eq!(merged, vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_merge_breaks_priority_ties_by_tx_id() {
        let parent = boxed(vec![staker(0, 5, 1)]);
        let own = boxed(vec![staker(0, 3, 2)]);

        let merged: Vec<TxId> = MergedStakerIterator::new(vec![parent, own], BTreeSet::new())
            .map(|s| s.tx_id)
            .collect();
        assert_eq!(merged, vec![Id([3; 32]), Id([5; 32])]);
    }

    #[test]
    fn test_deletions_suppress_parent_entries() {
        let victim = staker(0, 1, 7);
        let parent = boxed(vec![victim.clone(), staker(1, 2, 8)]);

        let deleted: BTreeSet<_> = [victim.key()].into_iter().collect();
        let merged: Vec<Staker> =
            MergedStakerIterator::new(vec![parent], deleted).collect();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].node_id, ShortId([8; 20]));
    }

    #[test]
    fn test_empty_streams() {
        let merged: Vec<Staker> =
            MergedStakerIterator::new(vec![boxed(vec![]), boxed(vec![])], BTreeSet::new())
                .collect();
        assert!(merged.is_empty());
    }
}
