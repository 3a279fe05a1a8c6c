use crate::validation::CheckKind;

#[derive(Debug, thiserror::Error)]
pub enum BrandError {
    #[error("Generation failed in round {round}: {message}")]
    Generation { round: usize, message: String },

    #[error("{check} check unavailable for '{name}': {message}")]
    CheckUnavailable { name: String, check: CheckKind, message: String },

    #[error("Selection error: {0}")]
    Selection(String),

    #[error("Malformed {stage} output: {message}")]
    MalformedOutput { stage: String, message: String },

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl BrandError {
    pub fn generation(round: usize, message: impl Into<String>) -> Self {
        Self::Generation { round, message: message.into() }
    }

    pub fn check_unavailable(
        name: impl Into<String>,
        check: CheckKind,
        message: impl Into<String>,
    ) -> Self {
        Self::CheckUnavailable { name: name.into(), check, message: message.into() }
    }

    pub fn selection(message: impl Into<String>) -> Self {
        Self::Selection(message.into())
    }

    pub fn malformed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedOutput { stage: stage.into(), message: message.into() }
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }

    /// True for failures worth one more attempt at the model boundary.
    pub fn is_malformed_output(&self) -> bool {
        matches!(self, Self::MalformedOutput { .. })
    }
}

pub type Result<T> = std::result::Result<T, BrandError>;
