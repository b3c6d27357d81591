use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::decoder::DecodingEngine;
use crate::dictionary::Dictionary;
use crate::error::DecoderError;
use crate::lattice::{ExpansionSummary, LatticeGraph};
use crate::model::AcousticModelSet;
use crate::pipeline::traits::FeatureSource;
use crate::types::{DecodeOutput, FeatureFrame};

/// A primed decoder: expanded lattice, shared models and the dictionary
/// used to name recognized words. Decodes one utterance per call.
pub struct Recognizer {
    engine: DecodingEngine,
    dictionary: Dictionary,
    models: Arc<AcousticModelSet>,
    summary: ExpansionSummary,
}

pub(crate) struct RecognizerParts {
    pub engine: DecodingEngine,
    pub dictionary: Dictionary,
    pub models: Arc<AcousticModelSet>,
    pub summary: ExpansionSummary,
}

impl Recognizer {
    pub(crate) fn from_parts(parts: RecognizerParts) -> Self {
        Self {
            engine: parts.engine,
            dictionary: parts.dictionary,
            models: parts.models,
            summary: parts.summary,
        }
    }

    pub fn recognize(&mut self, source: &mut dyn FeatureSource) -> Result<DecodeOutput, DecoderError> {
        self.recognize_with_cancel(source, &AtomicBool::new(false))
    }

    /// Like `recognize`, checking `cancel` before every frame.
    pub fn recognize_with_cancel(
        &mut self,
        source: &mut dyn FeatureSource,
        cancel: &AtomicBool,
    ) -> Result<DecodeOutput, DecoderError> {
        self.engine.reset();
        let mut frame = 0usize;
        loop {
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!(frame, "recognizer: cancelled");
                return Err(DecoderError::Cancelled { frame });
            }
            let Some(features) = source.next_frame()? else {
                break;
            };
            self.engine.process_frame(&features, frame)?;
            frame += 1;
        }
        self.engine.finish(&self.dictionary)
    }

    pub fn recognize_frames(&mut self, frames: &[FeatureFrame]) -> Result<DecodeOutput, DecoderError> {
        let mut source = crate::pipeline::defaults::FrameBuffer::new(frames.to_vec());
        self.recognize(&mut source)
    }

    /// Feature dimension the models expect.
    pub fn dimension(&self) -> Option<usize> {
        self.models.dimension()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn graph(&self) -> &LatticeGraph {
        self.engine.graph()
    }

    pub fn expansion_summary(&self) -> ExpansionSummary {
        self.summary
    }
}
