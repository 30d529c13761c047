use log::trace;

use crate::{NodeId, ProtocolMessage};

/// A message waiting to be handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub recipient: NodeId,
    pub message: ProtocolMessage,
}

// Broadcaster collects the messages produced while handling an input. It only
// queues them, delivery is done by whoever drains it.
#[derive(Debug)]
pub struct Broadcaster {
    self_id: NodeId,
    n: usize,
    outgoings: Vec<Outgoing>,
}

impl Broadcaster {
    pub fn new(self_id: NodeId, n: usize) -> Self {
        Self {
            self_id,
            n,
            outgoings: Vec::new(),
        }
    }

    /// Queues `message` for every node in the network, ourselves included.
    pub fn broadcast(&mut self, message: ProtocolMessage) {
        trace!("[BEN-{}] queueing {message:?} for {} nodes", self.self_id, self.n);
        self.outgoings
            .extend((0..self.n).map(|recipient| Outgoing { recipient, message }));
    }

    pub fn take_outgoings(&mut self) -> Vec<Outgoing> {
        std::mem::take(&mut self.outgoings)
    }

    #[cfg(test)]
    pub fn has_broadcast(&self, msg: &ProtocolMessage) -> bool {
        (0..self.n).all(|to| {
            self.outgoings
                .iter()
                .any(|out| out.recipient == to && &out.message == msg)
        })
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.outgoings.is_empty()
    }
}
