mod engine;
mod history;
mod token;

pub use engine::{DecodingEngine, Terminal};
pub use history::{backtrace, HistoryArena, HistoryId, WordLinkRecord};
pub use token::{DecodingToken, MergeOutcome, ModelInstance, TokenSet};
