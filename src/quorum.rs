use std::borrow::Borrow;

use crate::Value;

/// Outcome of counting the values of one phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    Majority(Value),
    NoMajority,
}

impl Tally {
    /// The value a node carries forward from this tally, `Unknown` when no
    /// value reached a majority.
    pub fn value(&self) -> Value {
        match self {
            Tally::Majority(v) => *v,
            Tally::NoMajority => Value::Unknown,
        }
    }
}

/// Counts zeros and ones, a value wins if it was sent by strictly more than
/// half of the `n` nodes. `Unknown` values are not counted for either side.
pub fn tally<V: Borrow<Value>>(values: impl IntoIterator<Item = V>, n: usize) -> Tally {
    let (mut zeros, mut ones) = (0usize, 0usize);
    for v in values {
        match v.borrow() {
            Value::Zero => zeros += 1,
            Value::One => ones += 1,
            Value::Unknown => (),
        }
    }

    if 2 * zeros > n {
        Tally::Majority(Value::Zero)
    } else if 2 * ones > n {
        Tally::Majority(Value::One)
    } else {
        Tally::NoMajority
    }
}
