pub mod config;
pub mod decoder;
pub mod dictionary;
pub mod error;
pub mod formats;
pub mod lattice;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod types;

pub use config::{DecoderConfig, TransitionLogBase};
pub use decoder::{backtrace, DecodingEngine, HistoryArena, HistoryId, WordLinkRecord};
pub use dictionary::Dictionary;
pub use error::DecoderError;
pub use lattice::{ExpandOptions, LatticeGraph, RawArc, RawLattice, RawNode};
pub use model::{AcousticModelSet, EmissionState, Hmm, Mixture, TransitionMatrix};
pub use pipeline::builder::RecognizerBuilder;
pub use pipeline::defaults::FrameBuffer;
pub use pipeline::runtime::Recognizer;
pub use pipeline::traits::{
    DictionaryProvider, EmissionProvider, FeatureSource, GraphProvider, ModelProvider, ModelTables,
};
pub use report::{DecodeReport, Meta, UtteranceReport};
pub use types::{DecodeOutput, FeatureFrame, RecognizedWord, Score, WordId};
