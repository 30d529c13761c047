use core::fmt::Debug;
use serde::{Deserialize, Serialize};

/// A binary consensus value. `Unknown` is what a node votes when it saw no
/// majority among the proposals, it is never decided.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Zero,
    One,
    Unknown,
}

impl Value {
    pub fn is_binary(&self) -> bool {
        !matches!(self, Value::Unknown)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b {
            Value::One
        } else {
            Value::Zero
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Zero => write!(f, "0"),
            Value::One => write!(f, "1"),
            Value::Unknown => write!(f, "?"),
        }
    }
}
