use serde::Serialize;

use crate::config::TransitionLogBase;
use crate::error::DecoderError;
use crate::types::{DecodeOutput, RecognizedWord, Score};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    pub schema_version: u32,
    pub meta: Meta,
    pub utterances: Vec<UtteranceReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub network_path: String,
    pub models_path: String,
    pub transition_log_base: TransitionLogBase,
    pub utterance_count: usize,
    pub failed_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UtteranceReport {
    pub id: String,
    pub frame_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<Score>,
    pub words: Vec<RecognizedWord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UtteranceReport {
    pub fn decoded(id: impl Into<String>, output: DecodeOutput) -> Self {
        Self {
            id: id.into(),
            frame_count: output.frame_count,
            total_score: Some(output.total_score),
            words: output.words,
            error: None,
        }
    }

    /// An utterance that produced no result; `frame_count` is what was read.
    pub fn failed(id: impl Into<String>, frame_count: usize, error: &DecoderError) -> Self {
        Self {
            id: id.into(),
            frame_count,
            total_score: None,
            words: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

impl DecodeReport {
    pub fn new(
        generated_at: String,
        network_path: String,
        models_path: String,
        transition_log_base: TransitionLogBase,
        utterances: Vec<UtteranceReport>,
    ) -> Self {
        let failed_count = utterances.iter().filter(|u| u.error.is_some()).count();
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            meta: Meta {
                generated_at,
                network_path,
                models_path,
                transition_log_base,
                utterance_count: utterances.len(),
                failed_count,
            },
            utterances,
        }
    }
}
