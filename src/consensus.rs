use std::collections::BTreeSet;

use log::{debug, info, trace};

use crate::broadcaster::Broadcaster;
use crate::coin::Coin;
use crate::ledger::RoundLedger;
use crate::quorum::{tally, Tally};
use crate::{NodeConfig, NodeId, NodeState, Phase, ProtocolMessage, Round, Status, Value};

// State transition
//
// +------------+       +------------+       +------------+
// | NotStarted | ----> |  Running   | ----> |  Decided   |
// +------------+       +------------+       +------------+
//       \                    |
//        \                   v
//         \------------> +------------+
//                        |   Killed   |
//                        +------------+
//
// Running loops over rounds: a proposal phase followed by a vote phase. A vote
// majority decides, otherwise the node flips a coin and proposes again in the
// next round.

/// The Ben-Or state machine of a single node.
pub struct BenOr {
    config: NodeConfig,
    killed: bool,
    round: Option<Round>,
    value: Option<Value>,
    decided: Option<bool>,
    ledger: RoundLedger,
    // (round, phase) buckets that already reached quorum and fired.
    resolved: BTreeSet<(Round, Phase)>,
    coin: Box<dyn Coin>,
}

impl std::fmt::Debug for BenOr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenOr")
            .field("id", &self.config.id)
            .field("killed", &self.killed)
            .field("round", &self.round)
            .field("value", &self.value)
            .field("decided", &self.decided)
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}

impl BenOr {
    pub fn new(config: NodeConfig, coin: Box<dyn Coin>) -> Self {
        let mut ben_or = Self {
            killed: false,
            round: None,
            value: Some(config.initial_value),
            decided: Some(false),
            ledger: RoundLedger::default(),
            resolved: BTreeSet::new(),
            coin,
            config,
        };
        if ben_or.config.is_faulty {
            ben_or.stop();
        }
        ben_or
    }

    pub fn id(&self) -> NodeId {
        self.config.id
    }

    pub fn ledger(&self) -> &RoundLedger {
        &self.ledger
    }

    pub fn round(&self) -> Option<Round> {
        self.round
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn is_decided(&self) -> bool {
        self.decided == Some(true)
    }

    pub fn status(&self) -> Status {
        if self.config.is_faulty {
            Status::Faulty
        } else {
            Status::Live
        }
    }

    pub fn state(&self) -> NodeState {
        if self.killed {
            return NodeState::killed();
        }
        NodeState {
            killed: false,
            value: self.value,
            decided: self.decided,
            round: self.round,
        }
    }

    /// Starts round 1 by proposing our initial value to everyone.
    /// A faulty node goes silent instead.
    pub fn start(&mut self, broadcaster: &mut Broadcaster) {
        if self.config.is_faulty {
            info!("[BEN-{}] faulty, not taking part in consensus", self.id());
            self.stop();
            return;
        }
        if self.killed {
            info!("[BEN-{}] stopped, ignoring start", self.id());
            return;
        }
        if self.is_decided() {
            debug!("[BEN-{}] already decided, ignoring start", self.id());
            return;
        }
        if let Some(round) = self.round {
            debug!("[BEN-{}] already running round {round}", self.id());
            return;
        }

        let value = self.config.initial_value;
        self.round = Some(1);
        self.value = Some(value);
        self.decided = Some(false);

        info!("[BEN-{}] starting with {value:?}", self.id());
        broadcaster.broadcast(ProtocolMessage::proposal(1, value, self.id()));
    }

    /// Kills the node. Everything it knew is forgotten and it ignores all
    /// further input.
    pub fn stop(&mut self) {
        if !self.killed {
            info!("[BEN-{}] stopping", self.id());
        }
        self.killed = true;
        self.round = None;
        self.value = None;
        self.decided = None;
    }

    pub fn handle_message(&mut self, msg: ProtocolMessage, broadcaster: &mut Broadcaster) {
        if self.killed {
            trace!("[BEN-{}] killed, dropping {msg:?}", self.id());
            return;
        }
        if msg.sender >= self.config.n {
            debug!("[BEN-{}] dropping {msg:?} from unknown sender", self.id());
            return;
        }

        debug!("[BEN-{}] handling {msg:?}", self.id());
        self.ledger.record(msg.round, msg.phase, msg.sender, msg.value);

        let bucket = (msg.round, msg.phase);
        if self.resolved.contains(&bucket)
            || self.ledger.count_for(msg.round, msg.phase) < self.config.quorum()
        {
            return;
        }
        self.resolved.insert(bucket);

        let result = tally(self.ledger.values_for(msg.round, msg.phase), self.config.n);
        match msg.phase {
            Phase::Proposal => self.resolve_proposals(msg.round, result, broadcaster),
            Phase::Vote => self.resolve_votes(msg.round, result, broadcaster),
        }
    }

    // We vote for whatever the proposals tallied to, `Unknown` included.
    fn resolve_proposals(&mut self, round: Round, result: Tally, broadcaster: &mut Broadcaster) {
        let vote = result.value();
        info!(
            "[BEN-{}] proposals of round {round} reached quorum, voting {vote:?}",
            self.id()
        );
        broadcaster.broadcast(ProtocolMessage::vote(round, vote, self.id()));
    }

    fn resolve_votes(&mut self, round: Round, result: Tally, broadcaster: &mut Broadcaster) {
        if self.is_decided() {
            debug!(
                "[BEN-{}] already decided, ignoring votes of round {round}",
                self.id()
            );
            return;
        }

        match result {
            Tally::Majority(value) => {
                info!("[BEN-{}] decided {value:?} in round {round}", self.id());
                self.decided = Some(true);
                self.value = Some(value);
                self.round.get_or_insert(round);
            }
            Tally::NoMajority => {
                if matches!(self.round, Some(current) if round < current) {
                    debug!(
                        "[BEN-{}] no majority in stale round {round}, already past it",
                        self.id()
                    );
                    return;
                }

                let next = match round.checked_add(1) {
                    Some(next) => next,
                    None => {
                        debug!("[BEN-{}] no round after {round}, dropping votes", self.id());
                        return;
                    }
                };
                let value = self.coin.flip();
                info!(
                    "[BEN-{}] no majority in round {round}, moving to round {next} with {value:?}",
                    self.id()
                );
                self.round = Some(next);
                self.value = Some(value);
                broadcaster.broadcast(ProtocolMessage::proposal(next, value, self.id()));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn force_round(&mut self, round: Round) {
        self.round = Some(round);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::ScriptedCoin;

    const N: usize = 4;
    const F: usize = 1;

    fn ben_or(id: NodeId, value: Value) -> (BenOr, Broadcaster) {
        let config = NodeConfig::new(id, N, F, value);
        (
            BenOr::new(config, Box::new(ScriptedCoin::new([true]))),
            Broadcaster::new(id, N),
        )
    }

    fn feed(node: &mut BenOr, b: &mut Broadcaster, msgs: impl IntoIterator<Item = ProtocolMessage>) {
        for msg in msgs {
            node.handle_message(msg, b);
        }
    }

    #[test]
    fn test_state_before_start() {
        let (node, _) = ben_or(0, Value::Zero);
        assert_eq!(
            node.state(),
            NodeState {
                killed: false,
                value: Some(Value::Zero),
                decided: Some(false),
                round: None,
            }
        );
        assert_eq!(node.status(), Status::Live);
    }

    #[test]
    fn test_start_broadcasts_proposal() {
        let (mut node, mut b) = ben_or(2, Value::One);
        node.start(&mut b);

        assert!(b.has_broadcast(&ProtocolMessage::proposal(1, Value::One, 2)));
        assert_eq!(node.round(), Some(1));
        assert_eq!(b.take_outgoings().len(), N);

        // starting twice does nothing
        node.start(&mut b);
        assert!(b.is_empty());
    }

    #[test]
    fn test_faulty_node_is_silent() {
        let config = NodeConfig::new(3, N, F, Value::One).faulty(true);
        let mut node = BenOr::new(config, Box::new(ScriptedCoin::default()));
        let mut b = Broadcaster::new(3, N);

        assert_eq!(node.status(), Status::Faulty);
        assert_eq!(node.state(), NodeState::killed());

        node.start(&mut b);
        feed(
            &mut node,
            &mut b,
            (0..N).map(|s| ProtocolMessage::proposal(1, Value::One, s)),
        );

        assert!(b.is_empty());
        assert!(node.ledger().is_empty());
        assert_eq!(node.state(), NodeState::killed());
    }

    #[test]
    fn test_proposal_quorum_triggers_exactly_one_vote() {
        let (mut node, mut b) = ben_or(0, Value::One);

        // N - F + 3 proposals for round 1, some of them repeated
        let msgs = [0, 1, 2, 3, 1, 2].map(|s| ProtocolMessage::proposal(1, Value::One, s));
        assert_eq!(msgs.len(), N - F + 3);
        feed(&mut node, &mut b, msgs);

        let outgoings = b.take_outgoings();
        assert_eq!(outgoings.len(), N);
        assert!(outgoings
            .iter()
            .all(|o| o.message == ProtocolMessage::vote(1, Value::One, 0)));
    }

    #[test]
    fn test_proposal_without_majority_votes_unknown() {
        let (mut node, mut b) = ben_or(0, Value::One);
        feed(
            &mut node,
            &mut b,
            [
                ProtocolMessage::proposal(1, Value::Zero, 0),
                ProtocolMessage::proposal(1, Value::One, 1),
                ProtocolMessage::proposal(1, Value::One, 2),
            ],
        );
        assert!(b.has_broadcast(&ProtocolMessage::vote(1, Value::Unknown, 0)));
    }

    #[test]
    fn test_no_vote_below_quorum() {
        let (mut node, mut b) = ben_or(0, Value::One);
        feed(
            &mut node,
            &mut b,
            [
                ProtocolMessage::proposal(1, Value::One, 0),
                ProtocolMessage::proposal(1, Value::One, 1),
                // same sender again, still two distinct senders
                ProtocolMessage::proposal(1, Value::One, 1),
            ],
        );
        assert!(b.is_empty());
    }

    #[test]
    fn test_vote_majority_decides() {
        let (mut node, mut b) = ben_or(1, Value::Zero);
        node.start(&mut b);
        b.take_outgoings();

        feed(
            &mut node,
            &mut b,
            (0..3).map(|s| ProtocolMessage::vote(1, Value::One, s)),
        );

        assert!(b.is_empty());
        assert_eq!(
            node.state(),
            NodeState {
                killed: false,
                value: Some(Value::One),
                decided: Some(true),
                round: Some(1),
            }
        );

        // a later round failing to reach a majority doesn't undo the decision
        feed(
            &mut node,
            &mut b,
            (0..3).map(|s| ProtocolMessage::vote(2, Value::Unknown, s)),
        );
        assert!(b.is_empty());
        assert_eq!(node.state().decision(), Some(Value::One));
        assert_eq!(node.round(), Some(1));
    }

    #[test]
    fn test_decided_node_still_answers_proposals() {
        let (mut node, mut b) = ben_or(1, Value::One);
        node.start(&mut b);
        feed(
            &mut node,
            &mut b,
            (0..3).map(|s| ProtocolMessage::vote(1, Value::One, s)),
        );
        assert!(node.is_decided());
        b.take_outgoings();

        feed(
            &mut node,
            &mut b,
            (0..3).map(|s| ProtocolMessage::proposal(2, Value::Zero, s)),
        );
        assert!(b.has_broadcast(&ProtocolMessage::vote(2, Value::Zero, 1)));
        assert_eq!(node.state().decision(), Some(Value::One));
    }

    #[test]
    fn test_no_vote_majority_flips_coin_and_advances() {
        let config = NodeConfig::new(0, N, F, Value::Zero);
        let mut node = BenOr::new(config, Box::new(ScriptedCoin::new([true, false])));
        let mut b = Broadcaster::new(0, N);
        node.start(&mut b);
        b.take_outgoings();

        feed(
            &mut node,
            &mut b,
            [
                ProtocolMessage::vote(1, Value::Unknown, 0),
                ProtocolMessage::vote(1, Value::One, 1),
                ProtocolMessage::vote(1, Value::Unknown, 2),
            ],
        );
        assert!(b.has_broadcast(&ProtocolMessage::proposal(2, Value::One, 0)));
        assert_eq!(node.round(), Some(2));
        assert_eq!(node.state().value, Some(Value::One));
        assert_eq!(node.state().decided, Some(false));
        b.take_outgoings();

        feed(
            &mut node,
            &mut b,
            (0..3).map(|s| ProtocolMessage::vote(2, Value::Unknown, s)),
        );
        assert!(b.has_broadcast(&ProtocolMessage::proposal(3, Value::Zero, 0)));
        assert_eq!(node.round(), Some(3));
    }

    #[test]
    fn test_stale_round_without_majority_is_ignored() {
        let (mut node, mut b) = ben_or(0, Value::Zero);
        node.start(&mut b);
        node.force_round(5);
        b.take_outgoings();

        feed(
            &mut node,
            &mut b,
            (0..3).map(|s| ProtocolMessage::vote(2, Value::Unknown, s)),
        );
        assert!(b.is_empty());
        assert_eq!(node.round(), Some(5));
    }

    #[test]
    fn test_stop_is_idempotent_and_masks_state() {
        let (mut node, mut b) = ben_or(0, Value::One);
        node.start(&mut b);
        feed(
            &mut node,
            &mut b,
            (0..3).map(|s| ProtocolMessage::vote(1, Value::One, s)),
        );
        assert!(node.is_decided());

        node.stop();
        let once = node.state();
        node.stop();
        assert_eq!(once, node.state());
        assert_eq!(once, NodeState::killed());
        assert!(node.is_killed());
    }

    #[test]
    fn test_killed_node_ignores_messages() {
        let (mut node, mut b) = ben_or(0, Value::One);
        node.stop();
        feed(
            &mut node,
            &mut b,
            (0..N).map(|s| ProtocolMessage::proposal(1, Value::One, s)),
        );
        assert!(node.ledger().is_empty());
        assert!(b.is_empty());

        // and cannot be restarted
        node.start(&mut b);
        assert!(b.is_empty());
        assert_eq!(node.state(), NodeState::killed());
    }

    #[test]
    fn test_unknown_sender_is_ignored() {
        let (mut node, mut b) = ben_or(0, Value::One);
        node.handle_message(ProtocolMessage::proposal(1, Value::One, N), &mut b);
        assert!(node.ledger().is_empty());
    }

    #[test]
    fn test_decision_before_start_survives_start() {
        let (mut node, mut b) = ben_or(3, Value::Zero);
        feed(
            &mut node,
            &mut b,
            (0..3).map(|s| ProtocolMessage::vote(1, Value::One, s)),
        );
        assert_eq!(
            node.state(),
            NodeState {
                killed: false,
                value: Some(Value::One),
                decided: Some(true),
                round: Some(1),
            }
        );

        node.start(&mut b);
        assert!(b.is_empty());
        assert_eq!(node.state().decision(), Some(Value::One));
        assert_eq!(node.round(), Some(1));

        // the last round 1 vote arriving late changes nothing
        node.handle_message(ProtocolMessage::vote(1, Value::One, 3), &mut b);
        assert_eq!(node.state().decision(), Some(Value::One));
    }

    #[test]
    fn test_last_round_without_majority_does_not_overflow() {
        let config = NodeConfig::new(0, 1, 0, Value::Zero);
        let mut node = BenOr::new(config, Box::new(ScriptedCoin::new([true])));
        let mut b = Broadcaster::new(0, 1);

        node.handle_message(
            ProtocolMessage::vote(Round::MAX, Value::Unknown, 0),
            &mut b,
        );
        assert!(b.is_empty());
        assert_eq!(node.round(), None);
        assert_eq!(node.state().decided, Some(false));

        // the node keeps working afterwards
        node.start(&mut b);
        assert!(b.has_broadcast(&ProtocolMessage::proposal(1, Value::Zero, 0)));
    }
}
