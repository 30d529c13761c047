use std::time::Duration;

use log::warn;

use crate::{Error, NodeId, Result, Value};

/// Delay between two polls of the readiness predicate while starting.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Fixed parameters of a node, set once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub id: NodeId,
    /// Total number of nodes, `N`.
    pub n: usize,
    /// Number of faulty nodes tolerated, `F`.
    pub f: usize,
    pub initial_value: Value,
    pub is_faulty: bool,
    pub poll_interval: Duration,
}

impl NodeConfig {
    pub fn new(id: NodeId, n: usize, f: usize, initial_value: Value) -> Self {
        Self {
            id,
            n,
            f,
            initial_value,
            is_faulty: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn faulty(mut self, is_faulty: bool) -> Self {
        self.is_faulty = is_faulty;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Number of distinct senders needed before a phase of a round resolves.
    pub fn quorum(&self) -> usize {
        self.n.saturating_sub(self.f)
    }

    /// Rejects configurations the protocol can't even be run with.
    /// `N > 2F` is only needed for safety and is merely warned about.
    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(Error::NoNodes);
        }
        if self.id >= self.n {
            return Err(Error::NodeOutOfRange {
                id: self.id,
                n: self.n,
            });
        }
        if self.f >= self.n {
            return Err(Error::NoQuorum {
                f: self.f,
                n: self.n,
            });
        }
        if self.n <= 2 * self.f {
            warn!(
                "[BEN-{}] n = {} does not exceed 2f = {}, agreement is not guaranteed",
                self.id,
                self.n,
                2 * self.f
            );
        }
        Ok(())
    }
}
