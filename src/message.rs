use core::fmt::Debug;
use serde::{Deserialize, Serialize};

use crate::{NodeId, Result, Value};

pub type Round = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Proposal,
    Vote,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolMessage {
    pub round: Round,
    pub phase: Phase,
    pub value: Value,
    pub sender: NodeId,
}

impl Debug for ProtocolMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "R{}-{}({:?})@{}",
            self.round,
            self.phase_str(),
            self.value,
            self.sender
        )
    }
}

impl ProtocolMessage {
    pub fn proposal(round: Round, value: Value, sender: NodeId) -> Self {
        Self {
            round,
            phase: Phase::Proposal,
            value,
            sender,
        }
    }

    pub fn vote(round: Round, value: Value, sender: NodeId) -> Self {
        Self {
            round,
            phase: Phase::Vote,
            value,
            sender,
        }
    }

    pub fn phase_str(&self) -> &str {
        match self.phase {
            Phase::Proposal => "propose",
            Phase::Vote => "vote",
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self)?)
    }

    /// Decodes a message off the wire. Anything that is not a well formed
    /// message (unknown phase or value tags, truncated payloads) is an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
