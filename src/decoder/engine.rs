use std::sync::Arc;

use super::history::{backtrace, HistoryArena, HistoryId, WordLinkRecord};
use super::token::{DecodingToken, TokenSet};
use crate::config::TransitionLogBase;
use crate::dictionary::Dictionary;
use crate::error::DecoderError;
use crate::lattice::{LatticeGraph, NodeKind, PhoneBinding};
use crate::model::{AcousticModelSet, EmissionCache, EmissionState, Hmm, TransitionMatrix};
use crate::types::{DecodeOutput, RecognizedWord, Score};

/// Hypothesis that left the lattice through the exit node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Terminal {
    pub history: Option<HistoryId>,
    pub score: Score,
    pub frame: usize,
}

/// A token in epsilon transit plus the next outgoing arc to try.
struct Pending {
    token: DecodingToken,
    /// History handed to successors; extended when leaving a word node.
    outgoing: Option<HistoryId>,
    next_arc: usize,
}

/// Frame-synchronous token-passing Viterbi decoder over an expanded lattice.
pub struct DecodingEngine {
    graph: LatticeGraph,
    models: Arc<AcousticModelSet>,
    log_base: TransitionLogBase,
    current: Vec<DecodingToken>,
    next: TokenSet,
    history: HistoryArena,
    emissions: EmissionCache,
    terminal: Option<Terminal>,
    frames: usize,
}

impl DecodingEngine {
    pub fn new(
        graph: LatticeGraph,
        models: Arc<AcousticModelSet>,
        log_base: TransitionLogBase,
    ) -> Self {
        let emissions = EmissionCache::new(models.states().len());
        let mut engine = Self {
            graph,
            models,
            log_base,
            current: Vec::new(),
            next: TokenSet::new(),
            history: HistoryArena::new(),
            emissions,
            terminal: None,
            frames: 0,
        };
        engine.initialize();
        engine
    }

    /// Seeds a single token at the entry node with entry score 0.
    pub fn initialize(&mut self) {
        let entry = self.graph.entry();
        self.next.merge(DecodingToken {
            node: entry,
            path_score: 0.0,
            entry_score: 0.0,
            frame: 0,
            history: None,
        });
    }

    /// Returns the engine to its freshly initialized state for a new utterance.
    pub fn reset(&mut self) {
        self.graph.reset_instances();
        self.current.clear();
        self.next.clear();
        self.history.clear();
        self.emissions.clear();
        self.terminal = None;
        self.frames = 0;
        self.initialize();
    }

    pub fn process_frame(&mut self, features: &[f64], frame: usize) -> Result<(), DecoderError> {
        self.eval_tokens(features, frame)?;
        self.propagate_tokens(frame);
        Ok(())
    }

    /// Scores every token resident on a phone node against `features`.
    ///
    /// A frame whose width differs from the models' feature dimension is
    /// rejected before any token moves, even if no phone would be scored.
    pub fn eval_tokens(&mut self, features: &[f64], frame: usize) -> Result<(), DecoderError> {
        if let Some(expected) = self.models.dimension() {
            if features.len() != expected {
                return Err(DecoderError::DimensionMismatch {
                    expected,
                    actual: features.len(),
                });
            }
        }
        self.current = self.next.take();
        self.frames = self.frames.max(frame + 1);

        let models = Arc::clone(&self.models);
        for token in &mut self.current {
            let node = self.graph.node_mut(token.node);
            let NodeKind::Phone(phone) = &mut node.kind else {
                continue;
            };
            let Some(binding) = phone.binding.as_mut() else {
                token.path_score = Score::NEG_INFINITY;
                continue;
            };
            let hmm = &models.models()[binding.model];
            binding.current.seed(token.entry_score, token.history);
            step_model(
                binding,
                hmm,
                models.transitions_for(hmm),
                models.states(),
                &mut self.emissions,
                self.log_base,
                features,
                frame,
            )?;
            token.path_score = binding.current.exit_score();
            token.history = binding.current.exit_token().history;
        }

        tracing::trace!(frame, active = self.current.len(), "decoder: scored frame");
        Ok(())
    }

    /// Advances every scored token through the lattice until it reaches a
    /// phone node (queued for the next frame) or the exit.
    pub fn propagate_tokens(&mut self, frame: usize) {
        let current = std::mem::take(&mut self.current);
        for token in &current {
            self.propagate_from(*token, frame);
        }
        self.current = current;
        tracing::trace!(frame, queued = self.next.len(), "decoder: propagated frame");
    }

    fn propagate_from(&mut self, origin: DecodingToken, frame: usize) {
        let mut stack = vec![self.arrive(origin, frame)];
        while let Some(top) = stack.last_mut() {
            let Some(&arc) = self.graph.node(top.token.node).out_arcs.get(top.next_arc) else {
                stack.pop();
                continue;
            };
            top.next_arc += 1;
            let score = top.token.path_score;
            let history = top.outgoing;
            let to = self.graph.arc(arc).to;

            if self.graph.node(to).is_phone() {
                self.next.merge(DecodingToken {
                    node: to,
                    path_score: Score::NEG_INFINITY,
                    entry_score: score,
                    frame,
                    history,
                });
            } else {
                let successor = DecodingToken {
                    node: to,
                    path_score: score,
                    entry_score: score,
                    frame,
                    history,
                };
                let pending = self.arrive(successor, frame);
                stack.push(pending);
            }
        }
    }

    /// Bookkeeping when a token lands on a node: re-arms the entry node,
    /// opens a word-link record when leaving a word node, and records
    /// hypotheses that reach the exit.
    fn arrive(&mut self, token: DecodingToken, frame: usize) -> Pending {
        if token.node == self.graph.entry() {
            self.next.merge(DecodingToken {
                node: token.node,
                path_score: Score::NEG_INFINITY,
                entry_score: Score::NEG_INFINITY,
                frame,
                history: token.history,
            });
        }

        let node = self.graph.node(token.node);
        if !token.is_reachable() {
            return Pending {
                token,
                outgoing: token.history,
                next_arc: node.out_arcs.len(),
            };
        }
        if node.out_arcs.is_empty() {
            self.terminal = Some(Terminal {
                history: token.history,
                score: token.path_score,
                frame,
            });
        }

        let outgoing = match node.kind {
            NodeKind::Word { word_id } if !node.out_arcs.is_empty() => {
                Some(self.history.push(WordLinkRecord {
                    frame,
                    score: token.path_score,
                    word_id,
                    parent: token.history,
                }))
            }
            _ => token.history,
        };
        Pending {
            token,
            outgoing,
            next_arc: 0,
        }
    }

    pub fn graph(&self) -> &LatticeGraph {
        &self.graph
    }

    pub fn history(&self) -> &HistoryArena {
        &self.history
    }

    /// Tokens queued for the next frame.
    pub fn pending_tokens(&self) -> &TokenSet {
        &self.next
    }

    /// Most recent hypothesis to reach the exit, if any.
    pub fn terminal(&self) -> Option<&Terminal> {
        self.terminal.as_ref()
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn backtrace(&self, dictionary: &Dictionary) -> Result<Vec<RecognizedWord>, DecoderError> {
        let terminal = self.terminal.ok_or(DecoderError::EmptyHistory)?;
        match terminal.history {
            Some(_) => backtrace(terminal.history, &self.history, dictionary),
            None => Ok(Vec::new()),
        }
    }

    pub fn finish(&self, dictionary: &Dictionary) -> Result<DecodeOutput, DecoderError> {
        let words = self.backtrace(dictionary)?;
        let total_score = self.terminal.map_or(Score::NEG_INFINITY, |t| t.score);
        tracing::debug!(
            frames = self.frames,
            words = words.len(),
            total_score,
            history_records = self.history.len(),
            "decoder: utterance finished"
        );
        Ok(DecodeOutput {
            words,
            frame_count: self.frames,
            total_score,
        })
    }
}

/// Within-model Viterbi step for one frame. Emitting states are filled
/// left to right from `current` into `scratch`, copied back, then the exit
/// state takes the best emitting state plus its exit transition.
#[allow(clippy::too_many_arguments)]
fn step_model(
    binding: &mut PhoneBinding,
    hmm: &Hmm,
    trans: &TransitionMatrix,
    states: &[EmissionState],
    emissions: &mut EmissionCache,
    log_base: TransitionLogBase,
    features: &[f64],
    frame: usize,
) -> Result<(), DecoderError> {
    let n = hmm.state_count();
    let exit = n - 1;
    let PhoneBinding {
        current, scratch, ..
    } = binding;
    let log_trans = |from: usize, to: usize| log_base.apply(trans.prob(from, to));

    for j in hmm.emitting_states() {
        let best = best_predecessor(current.tokens(), 0..=j, |i| log_trans(i, j));
        let target = &mut scratch.tokens_mut()[j];
        match best {
            Some(i) => {
                let source = current.tokens()[i];
                let emission =
                    emissions.evaluate(states, hmm.state_indices[j], features, frame)?;
                target.path_score =
                    source.path_score + (log_trans(i, j) as Score + emission as Score);
                target.frame = source.frame;
                target.history = source.history;
            }
            None => target.clear(),
        }
    }

    let mut max_score = Score::NEG_INFINITY;
    for j in hmm.emitting_states() {
        let filled = scratch.tokens()[j];
        let token = &mut current.tokens_mut()[j];
        token.path_score = filled.path_score;
        token.frame = filled.frame;
        token.history = filled.history;
        max_score = max_score.max(token.path_score);
    }

    let best_exit = best_predecessor(current.tokens(), hmm.emitting_states(), |j| {
        log_trans(j, exit)
    });
    match best_exit {
        Some(j) => {
            let source = current.tokens()[j];
            let token = &mut current.tokens_mut()[exit];
            token.path_score = source.path_score + log_trans(j, exit) as Score;
            token.frame = source.frame;
            token.history = source.history;
        }
        None => current.tokens_mut()[exit].clear(),
    }
    let exit_score = current.tokens()[exit].path_score;
    current.set_scores(max_score, exit_score);
    Ok(())
}

/// Index maximizing `path_score + log_trans(i)`; first index wins ties and
/// unreachable candidates are never chosen.
fn best_predecessor(
    tokens: &[DecodingToken],
    candidates: impl IntoIterator<Item = usize>,
    log_trans: impl Fn(usize) -> f64,
) -> Option<usize> {
    let mut best = None;
    let mut best_score = f64::NEG_INFINITY;
    for i in candidates {
        let score = f64::from(tokens[i].path_score) + log_trans(i);
        if score > best_score {
            best_score = score;
            best = Some(i);
        }
    }
    best
}
