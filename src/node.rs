use std::sync::Arc;
use std::thread;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::broadcaster::{Broadcaster, Outgoing};
use crate::coin::{Coin, RngCoin};
use crate::consensus::BenOr;
use crate::ledger::RoundLedger;
use crate::readiness::Readiness;
use crate::transport::Transport;
use crate::{NodeConfig, NodeId, NodeState, ProtocolMessage, Result, Status};

/// A running node: the entry point for everything the outside world can ask
/// of it.
///
/// Inputs are handled one at a time behind a lock, so recording a message,
/// checking the quorum and acting on it happen as a single step. Messages
/// produced along the way are sent once the lock is released.
pub struct Node {
    id: NodeId,
    n: usize,
    poll_interval: std::time::Duration,
    consensus: Mutex<BenOr>,
    transport: Arc<dyn Transport>,
    readiness: Arc<dyn Readiness>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("consensus", &*self.consensus.lock())
            .finish_non_exhaustive()
    }
}

impl Node {
    pub fn new(
        config: NodeConfig,
        transport: Arc<dyn Transport>,
        readiness: Arc<dyn Readiness>,
    ) -> Result<Self> {
        Self::with_coin(
            config,
            transport,
            readiness,
            Box::new(RngCoin::from_entropy()),
        )
    }

    pub fn with_coin(
        config: NodeConfig,
        transport: Arc<dyn Transport>,
        readiness: Arc<dyn Readiness>,
        coin: Box<dyn Coin>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id: config.id,
            n: config.n,
            poll_interval: config.poll_interval,
            consensus: Mutex::new(BenOr::new(config, coin)),
            transport,
            readiness,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn status(&self) -> Status {
        self.consensus.lock().status()
    }

    pub fn state(&self) -> NodeState {
        self.consensus.lock().state()
    }

    pub fn stop(&self) {
        self.consensus.lock().stop()
    }

    /// A copy of everything this node has recorded so far.
    pub fn ledger(&self) -> RoundLedger {
        self.consensus.lock().ledger().clone()
    }

    /// Waits for every peer to be reachable, then proposes our initial value.
    /// Returns as soon as the proposal was handed to the transport.
    pub fn start(&self) {
        while !self.readiness.is_ready() {
            thread::sleep(self.poll_interval);
        }

        let outgoings = {
            let mut consensus = self.consensus.lock();
            let mut broadcaster = Broadcaster::new(self.id, self.n);
            consensus.start(&mut broadcaster);
            broadcaster.take_outgoings()
        };
        self.send_all(outgoings);
    }

    pub fn deliver(&self, msg: ProtocolMessage) {
        let outgoings = {
            let mut consensus = self.consensus.lock();
            let mut broadcaster = Broadcaster::new(self.id, self.n);
            consensus.handle_message(msg, &mut broadcaster);
            broadcaster.take_outgoings()
        };
        self.send_all(outgoings);
    }

    /// Delivers a message straight off the wire, malformed input is dropped.
    pub fn deliver_bytes(&self, bytes: &[u8]) {
        match ProtocolMessage::from_bytes(bytes) {
            Ok(msg) => self.deliver(msg),
            Err(err) => debug!(
                "[BEN-{}] dropping malformed message {}: {err}",
                self.id,
                hex::encode(bytes)
            ),
        }
    }

    fn send_all(&self, outgoings: Vec<Outgoing>) {
        for Outgoing { recipient, message } in outgoings {
            if let Err(err) = self.transport.send(recipient, &message) {
                warn!(
                    "[BEN-{}] failed to send {message:?} to {recipient}, dropping: {err}",
                    self.id
                );
            }
        }
    }
}
