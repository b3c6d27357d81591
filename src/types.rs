use serde::Serialize;

/// Log-domain path score. `f32::NEG_INFINITY` marks an unreached hypothesis.
pub type Score = f32;

/// Dense dictionary word id.
pub type WordId = usize;

/// One analysis frame of acoustic features.
pub type FeatureFrame = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedWord {
    pub word: String,
    /// Frame at which the word boundary was crossed.
    pub end_frame: usize,
    /// Score gained since the previous recognized word (first word: since 0).
    pub score_delta: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeOutput {
    pub words: Vec<RecognizedWord>,
    pub frame_count: usize,
    /// Cumulative score of the hypothesis that reached the lattice exit.
    pub total_score: Score,
}
