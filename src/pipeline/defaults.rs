use std::path::{Path, PathBuf};

use crate::dictionary::Dictionary;
use crate::error::DecoderError;
use crate::formats;
use crate::lattice::RawLattice;
use crate::model::EmissionState;
use crate::pipeline::traits::{
    DictionaryProvider, EmissionProvider, FeatureSource, GraphProvider, ModelProvider, ModelTables,
};
use crate::types::FeatureFrame;

pub struct LexiconFile(pub PathBuf);

impl DictionaryProvider for LexiconFile {
    fn load_dictionary(&self) -> Result<Dictionary, DecoderError> {
        formats::read_lexicon(&self.0)
    }
}

pub struct ModelFiles {
    pub models_path: PathBuf,
    pub transitions_path: PathBuf,
}

impl ModelProvider for ModelFiles {
    fn load_models(&self) -> Result<ModelTables, DecoderError> {
        Ok(ModelTables {
            models: formats::read_models(&self.models_path)?,
            transitions: formats::read_transitions(&self.transitions_path)?,
        })
    }
}

pub struct StatesFile(pub PathBuf);

impl EmissionProvider for StatesFile {
    fn load_states(&self) -> Result<Vec<EmissionState>, DecoderError> {
        formats::read_states(&self.0)
    }
}

pub struct NetworkFile(pub PathBuf);

impl GraphProvider for NetworkFile {
    fn load_graph(&self) -> Result<RawLattice, DecoderError> {
        formats::read_network(&self.0)
    }
}

impl DictionaryProvider for Dictionary {
    fn load_dictionary(&self) -> Result<Dictionary, DecoderError> {
        Ok(self.clone())
    }
}

impl ModelProvider for ModelTables {
    fn load_models(&self) -> Result<ModelTables, DecoderError> {
        Ok(self.clone())
    }
}

impl EmissionProvider for Vec<EmissionState> {
    fn load_states(&self) -> Result<Vec<EmissionState>, DecoderError> {
        Ok(self.clone())
    }
}

impl GraphProvider for RawLattice {
    fn load_graph(&self) -> Result<RawLattice, DecoderError> {
        Ok(self.clone())
    }
}

/// Frames held in memory, handed out front to back.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    frames: Vec<FeatureFrame>,
    position: usize,
}

impl FrameBuffer {
    pub fn new(frames: Vec<FeatureFrame>) -> Self {
        Self {
            frames,
            position: 0,
        }
    }

    /// Loads a little-endian `f64` feature file of the given dimension.
    pub fn from_file(path: &Path, dimension: usize) -> Result<Self, DecoderError> {
        Ok(Self::new(formats::read_features(path, dimension)?))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FeatureSource for FrameBuffer {
    fn next_frame(&mut self) -> Result<Option<FeatureFrame>, DecoderError> {
        let frame = self.frames.get(self.position).cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn remaining_hint(&self) -> Option<usize> {
        Some(self.frames.len() - self.position)
    }
}
