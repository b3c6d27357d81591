use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: line {line}: {message}")]
    Parse {
        context: &'static str,
        line: usize,
        message: String,
    },
    #[error("malformed lattice: {message}")]
    GraphStructure { message: String },
    #[error("invalid acoustic model: {message}")]
    InvalidModel { message: String },
    #[error("feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("phone '{phone}' of word '{word}' matches no acoustic model")]
    UnboundPhone { phone: String, word: String },
    #[error("no recognition result: no hypothesis reached the lattice exit")]
    EmptyHistory,
    #[error("decoding cancelled before frame {frame}")]
    Cancelled { frame: usize },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl DecoderError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn parse(context: &'static str, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            context,
            line,
            message: message.into(),
        }
    }

    pub(crate) fn graph(message: impl Into<String>) -> Self {
        Self::GraphStructure {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
