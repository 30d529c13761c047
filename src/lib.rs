pub mod broadcaster;
pub mod coin;
pub mod config;
pub mod consensus;
pub mod error;
pub mod ledger;
pub mod message;
pub mod node;
pub mod quorum;
pub mod readiness;
pub mod state;
pub mod transport;
pub mod value;

pub use crate::broadcaster::{Broadcaster, Outgoing};
pub use crate::coin::{Coin, RngCoin, ScriptedCoin};
pub use crate::config::NodeConfig;
pub use crate::consensus::BenOr;
pub use crate::error::{Error, Result};
pub use crate::ledger::RoundLedger;
pub use crate::message::{Phase, ProtocolMessage, Round};
pub use crate::node::Node;
pub use crate::quorum::{tally, Tally};
pub use crate::readiness::{ReadySet, Readiness};
pub use crate::state::{NodeState, Status};
pub use crate::transport::Transport;
pub use crate::value::Value;

pub type NodeId = usize;
