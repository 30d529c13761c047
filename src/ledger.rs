use std::collections::{BTreeMap, BTreeSet};

use crate::{NodeId, Phase, Round, Value};

/// Every value received per (round, phase), keyed by sender.
///
/// A sender has at most one entry per bucket, a later message overwrites the
/// earlier one. Buckets are created on first use and kept for the lifetime of
/// the node. Deciding when a bucket has enough entries is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundLedger {
    buckets: BTreeMap<(Round, Phase), BTreeMap<NodeId, Value>>,
}

impl RoundLedger {
    pub fn record(&mut self, round: Round, phase: Phase, sender: NodeId, value: Value) {
        self.buckets
            .entry((round, phase))
            .or_default()
            .insert(sender, value);
    }

    pub fn count_for(&self, round: Round, phase: Phase) -> usize {
        self.buckets
            .get(&(round, phase))
            .map(BTreeMap::len)
            .unwrap_or_default()
    }

    pub fn values_for(&self, round: Round, phase: Phase) -> Vec<Value> {
        self.buckets
            .get(&(round, phase))
            .map(|bucket| bucket.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn senders_for(&self, round: Round, phase: Phase) -> BTreeSet<NodeId> {
        self.buckets
            .get(&(round, phase))
            .map(|bucket| bucket.keys().copied().collect())
            .unwrap_or_default()
    }

    /// All senders seen in any bucket.
    pub fn senders(&self) -> BTreeSet<NodeId> {
        self.buckets
            .values()
            .flat_map(|bucket| bucket.keys().copied())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
