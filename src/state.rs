use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Round, Value};

/// Externally observable state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub killed: bool,
    #[serde(rename = "x")]
    pub value: Option<Value>,
    pub decided: Option<bool>,
    #[serde(rename = "k")]
    pub round: Option<Round>,
}

impl NodeState {
    /// The shape reported by a stopped or faulty node, whatever it did before.
    pub fn killed() -> Self {
        Self {
            killed: true,
            value: None,
            decided: None,
            round: None,
        }
    }

    pub fn decision(&self) -> Option<Value> {
        match (self.decided, self.value) {
            (Some(true), Some(v)) => Some(v),
            _ => None,
        }
    }
}

/// Health of a node, this only reflects how the node was configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Live,
    Faulty,
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Live => write!(f, "live"),
            Status::Faulty => write!(f, "faulty"),
        }
    }
}
