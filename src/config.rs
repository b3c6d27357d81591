use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DecoderError;

/// Logarithm base applied to transition probabilities inside the Viterbi
/// recurrence. Emission scores are always natural-log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionLogBase {
    /// Reference behaviour: transitions scored with `log10`, emissions with `ln`.
    #[default]
    Base10,
    /// Both terms in natural log. Changes decoding outcomes.
    Natural,
}

impl TransitionLogBase {
    pub fn apply(self, probability: f64) -> f64 {
        match self {
            Self::Base10 => probability.log10(),
            Self::Natural => probability.ln(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub lexicon_path: String,
    pub models_path: String,
    pub states_path: String,
    pub transitions_path: String,
    pub network_path: String,
    pub epsilon_label: String,
    pub transition_log_base: TransitionLogBase,
    /// Fail expansion when a phone matches no model instead of leaving it unbound.
    pub strict_model_binding: bool,
}

impl DecoderConfig {
    pub const DEFAULT_EPSILON_LABEL: &'static str = "!NULL";

    pub fn load(path: &Path) -> Result<Self, DecoderError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| DecoderError::io("read decoder config", e))?;
        serde_json::from_str(&data).map_err(|e| DecoderError::json("parse decoder config", e))
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            lexicon_path: String::new(),
            models_path: String::new(),
            states_path: String::new(),
            transitions_path: String::new(),
            network_path: String::new(),
            epsilon_label: Self::DEFAULT_EPSILON_LABEL.to_string(),
            transition_log_base: TransitionLogBase::Base10,
            strict_model_binding: false,
        }
    }
}
