use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggError {
    #[error("invalid accumulator '{output}' over '{field}': {reason}")]
    InvalidAccumulator { output: String, field: String, reason: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<std::io::Error> for AggError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
