use thiserror::Error;

/// Failures surfaced by the analysis engine.
///
/// Both kinds are caller defects. The engine performs no I/O, so nothing
/// here is transient or retryable.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}
