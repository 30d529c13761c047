use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::Value;

/// Source of the random bit used when a round ends without a majority.
pub trait Coin: Send {
    /// Returns `Value::Zero` or `Value::One`, never `Value::Unknown`.
    fn flip(&mut self) -> Value;
}

/// A fair coin backed by any `rand` generator.
#[derive(Debug)]
pub struct RngCoin<R: Rng + Send>(R);

impl<R: Rng + Send> RngCoin<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngCoin<StdRng> {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> Coin for RngCoin<R> {
    fn flip(&mut self) -> Value {
        Value::from(self.0.gen::<bool>())
    }
}

/// Replays a fixed sequence of flips, wrapping around once exhausted.
/// An empty script always flips zero.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCoin {
    script: Vec<bool>,
    next: usize,
}

impl ScriptedCoin {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: script.into_iter().collect(),
            next: 0,
        }
    }

    pub fn flips(&self) -> usize {
        self.next
    }
}

impl Coin for ScriptedCoin {
    fn flip(&mut self) -> Value {
        let bit = match self.script.len() {
            0 => false,
            len => self.script[self.next % len],
        };
        self.next += 1;
        Value::from(bit)
    }
}
