use thiserror::Error;
use uuid::Uuid;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Boundary Error: {0}")]
    Boundary(#[from] BoundaryError),
    #[error("Session Error: {0}")]
    Session(#[from] SessionError),
    #[error("Coordinator Error: {0}")]
    Coordinator(String),
}

// Raised while building a session; always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("The pose sequence is empty.")]
    EmptySequence,
    #[error("Progress step must be greater than 0, got {0}")]
    InvalidProgressStep(f32),
    #[error("Hold threshold must be in (0, 100], got {0}")]
    InvalidHoldThreshold(f32),
    #[error("Match confidence floor must be in [0, 1], got {0}")]
    InvalidConfidenceFloor(f32),
    #[error("Learn mode requires a pose to practice")]
    MissingLearnPose,
    #[error("Invalid setting '{field}': {reason}")]
    InvalidSetting { field: &'static str, reason: String },
    #[error("Failed to load settings: {0}")]
    Load(String),
}

impl From<::config::ConfigError> for ConfigError {
    fn from(error: ::config::ConfigError) -> Self {
        ConfigError::Load(error.to_string())
    }
}

// Observation source failures. These are normalized before reaching the engine.
#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("Classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Classifier returned status {0}")]
    Status(u16),
    #[error("Classifier request timed out")]
    Timeout,
    #[error("Malformed classifier response: {0}")]
    Malformed(String),
    #[error("Frame source closed")]
    SourceClosed,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session {0} is no longer running")]
    Closed(Uuid),
    #[error("Session task failed: {0}")]
    TaskFailed(String),
}
