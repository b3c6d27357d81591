use std::collections::HashMap;

use super::history::HistoryId;
use crate::lattice::NodeIndex;
use crate::types::Score;

/// One active hypothesis: a cumulative log score plus a word-history handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingToken {
    pub node: NodeIndex,
    pub path_score: Score,
    pub entry_score: Score,
    pub frame: usize,
    pub history: Option<HistoryId>,
}

impl DecodingToken {
    pub fn unscored(node: NodeIndex) -> Self {
        Self {
            node,
            path_score: Score::NEG_INFINITY,
            entry_score: Score::NEG_INFINITY,
            frame: 0,
            history: None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.path_score > Score::NEG_INFINITY
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::unscored(self.node);
    }
}

/// Per-state tokens of one phone model; index 0 and N-1 are the
/// non-emitting entry and exit states.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    tokens: Vec<DecodingToken>,
    max_score: Score,
    exit_score: Score,
}

impl ModelInstance {
    pub fn new(node: NodeIndex, state_count: usize) -> Self {
        let mut instance = Self {
            tokens: vec![DecodingToken::unscored(node); state_count],
            max_score: Score::NEG_INFINITY,
            exit_score: Score::NEG_INFINITY,
        };
        instance.reset();
        instance
    }

    pub fn reset(&mut self) {
        for token in &mut self.tokens {
            token.clear();
        }
        if let Some(first) = self.tokens.first_mut() {
            first.path_score = 0.0;
        }
        self.max_score = Score::NEG_INFINITY;
        self.exit_score = Score::NEG_INFINITY;
    }

    pub fn state_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn tokens(&self) -> &[DecodingToken] {
        &self.tokens
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut [DecodingToken] {
        &mut self.tokens
    }

    pub fn max_score(&self) -> Score {
        self.max_score
    }

    pub fn exit_score(&self) -> Score {
        self.exit_score
    }

    /// Token in the non-emitting exit state.
    pub fn exit_token(&self) -> &DecodingToken {
        &self.tokens[self.tokens.len() - 1]
    }

    /// Loads an incoming hypothesis into the non-emitting entry state.
    pub(crate) fn seed(&mut self, entry_score: Score, history: Option<HistoryId>) {
        let first = &mut self.tokens[0];
        first.path_score = entry_score;
        first.history = history;
    }

    pub(crate) fn set_scores(&mut self, max_score: Score, exit_score: Score) {
        self.max_score = max_score;
        self.exit_score = exit_score;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced,
    Kept,
}

/// Tokens waiting for the next frame, at most one per node. Insertion
/// order is preserved so decoding is deterministic.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: Vec<DecodingToken>,
    slots: HashMap<NodeIndex, usize>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Viterbi merge: keeps the higher entry score per node; ties keep the
    /// resident token.
    pub fn merge(&mut self, candidate: DecodingToken) -> MergeOutcome {
        match self.slots.get(&candidate.node) {
            Some(&slot) => {
                let resident = &mut self.tokens[slot];
                if resident.entry_score < candidate.entry_score {
                    resident.entry_score = candidate.entry_score;
                    resident.history = candidate.history;
                    MergeOutcome::Replaced
                } else {
                    MergeOutcome::Kept
                }
            }
            None => {
                self.slots.insert(candidate.node, self.tokens.len());
                self.tokens.push(candidate);
                MergeOutcome::Inserted
            }
        }
    }

    pub fn get(&self, node: NodeIndex) -> Option<&DecodingToken> {
        self.slots.get(&node).map(|&slot| &self.tokens[slot])
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecodingToken> {
        self.tokens.iter()
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
        self.slots.clear();
    }

    /// Empties the set, returning its tokens in insertion order.
    pub fn take(&mut self) -> Vec<DecodingToken> {
        self.slots.clear();
        std::mem::take(&mut self.tokens)
    }
}
