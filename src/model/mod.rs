use std::collections::HashMap;

use crate::error::DecoderError;

mod emission;
mod hmm;

pub use emission::{log_add, EmissionCache, EmissionState, Mixture, LOG_EPS};
pub use hmm::{Hmm, TransitionMatrix};

/// Phone models, their transition matrices and the shared emission-state
/// table. Immutable once built; shared read-only by decoders.
#[derive(Debug, Clone)]
pub struct AcousticModelSet {
    models: Vec<Hmm>,
    transitions: HashMap<usize, TransitionMatrix>,
    states: Vec<EmissionState>,
}

impl AcousticModelSet {
    pub fn new(
        models: Vec<Hmm>,
        transitions: HashMap<usize, TransitionMatrix>,
        states: Vec<EmissionState>,
    ) -> Result<Self, DecoderError> {
        if let Some(first) = states.first() {
            let dim = first.dimension();
            if let Some((i, s)) = states.iter().enumerate().find(|(_, s)| s.dimension() != dim) {
                return Err(DecoderError::invalid_model(format!(
                    "emission state {i} has dimension {}, expected {dim}",
                    s.dimension()
                )));
            }
        }

        for hmm in &models {
            let n = hmm.state_count();
            if n < 3 {
                return Err(DecoderError::invalid_model(format!(
                    "model '{}' has {n} states; at least one emitting state is required",
                    hmm.label
                )));
            }
            let trans = transitions.get(&hmm.transition_index).ok_or_else(|| {
                DecoderError::invalid_model(format!(
                    "model '{}' references missing transition matrix {}",
                    hmm.label, hmm.transition_index
                ))
            })?;
            if trans.size() != n {
                return Err(DecoderError::invalid_model(format!(
                    "model '{}' has {n} states but transition matrix {} is {}x{}",
                    hmm.label,
                    hmm.transition_index,
                    trans.size(),
                    trans.size()
                )));
            }
            for j in hmm.emitting_states() {
                let idx = hmm.state_indices[j];
                if idx >= states.len() {
                    return Err(DecoderError::invalid_model(format!(
                        "model '{}' state {j} references emission state {idx}, only {} exist",
                        hmm.label,
                        states.len()
                    )));
                }
            }
        }

        Ok(Self {
            models,
            transitions,
            states,
        })
    }

    pub fn models(&self) -> &[Hmm] {
        &self.models
    }

    pub fn model(&self, position: usize) -> Option<&Hmm> {
        self.models.get(position)
    }

    /// Position of the first model whose label equals `label`.
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.models.iter().position(|hmm| hmm.label == label)
    }

    /// Transition matrix of `hmm`; existence is checked in `new`.
    pub fn transitions_for(&self, hmm: &Hmm) -> &TransitionMatrix {
        &self.transitions[&hmm.transition_index]
    }

    pub fn states(&self) -> &[EmissionState] {
        &self.states
    }

    /// Feature dimension shared by every emission state.
    pub fn dimension(&self) -> Option<usize> {
        self.states.first().map(EmissionState::dimension)
    }
}
