use std::collections::HashMap;

use crate::dictionary::Dictionary;
use crate::error::DecoderError;
use crate::lattice::RawLattice;
use crate::model::{EmissionState, Hmm, TransitionMatrix};
use crate::types::FeatureFrame;

/// Phone models plus the transition matrices they reference.
#[derive(Debug, Clone, Default)]
pub struct ModelTables {
    pub models: Vec<Hmm>,
    pub transitions: HashMap<usize, TransitionMatrix>,
}

pub trait DictionaryProvider: Send + Sync {
    fn load_dictionary(&self) -> Result<Dictionary, DecoderError>;
}

pub trait ModelProvider: Send + Sync {
    fn load_models(&self) -> Result<ModelTables, DecoderError>;
}

pub trait EmissionProvider: Send + Sync {
    /// States in the order the models' state indices address them.
    fn load_states(&self) -> Result<Vec<EmissionState>, DecoderError>;
}

pub trait GraphProvider: Send + Sync {
    fn load_graph(&self) -> Result<RawLattice, DecoderError>;
}

/// Pull-based stream of feature frames for one utterance.
pub trait FeatureSource {
    /// Next frame in temporal order, or `None` once the utterance ends.
    fn next_frame(&mut self) -> Result<Option<FeatureFrame>, DecoderError>;

    /// Number of frames left, when known up front.
    fn remaining_hint(&self) -> Option<usize> {
        None
    }
}
