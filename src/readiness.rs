use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::NodeId;

/// Tells a starting node whether every peer can be reached yet.
pub trait Readiness: Send + Sync {
    fn is_ready(&self) -> bool;
}

impl<F: Fn() -> bool + Send + Sync> Readiness for F {
    fn is_ready(&self) -> bool {
        self()
    }
}

/// Shared registry where each node announces itself once it can receive
/// messages. Ready once all `n` nodes did so.
#[derive(Debug)]
pub struct ReadySet {
    ready: Vec<AtomicBool>,
}

impl ReadySet {
    pub fn new(n: usize) -> Self {
        Self {
            ready: (0..n).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub fn mark_ready(&self, id: NodeId) {
        match self.ready.get(id) {
            Some(flag) => flag.store(true, Ordering::SeqCst),
            None => debug!("ignoring readiness of unknown node {id}"),
        }
    }

    pub fn ready_count(&self) -> usize {
        self.ready
            .iter()
            .filter(|flag| flag.load(Ordering::SeqCst))
            .count()
    }
}

impl Readiness for ReadySet {
    fn is_ready(&self) -> bool {
        self.ready.iter().all(|flag| flag.load(Ordering::SeqCst))
    }
}
