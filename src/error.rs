use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to encode with bincode")]
    Encoding(#[from] bincode::Error),
    #[error("A network needs at least one node")]
    NoNodes,
    #[error("Node id {id} is outside of the network (n = {n})")]
    NodeOutOfRange { id: NodeId, n: usize },
    #[error("Fault tolerance {f} leaves no quorum in a network of {n} nodes")]
    NoQuorum { f: usize, n: usize },
    #[error("Peer {0} is unreachable")]
    Unreachable(NodeId),
}

pub type Result<T> = std::result::Result<T, Error>;
