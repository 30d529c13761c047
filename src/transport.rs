use crate::{NodeId, ProtocolMessage, Result};

/// Best-effort point-to-point delivery of protocol messages.
///
/// A send may fail or silently lose the message. The node logs failed sends
/// and moves on, it never retries nor waits on a peer.
pub trait Transport: Send + Sync {
    fn send(&self, to: NodeId, msg: &ProtocolMessage) -> Result<()>;
}
