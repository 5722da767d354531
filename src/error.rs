use thiserror::Error;

/// A policy's params could not be coerced into its rule type's parameters.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid params for {rule_type}: {message}")]
pub struct RuleParamError {
    pub rule_type: String,
    pub message: String,
}

impl RuleParamError {
    pub fn new(rule_type: impl Into<String>, message: impl Into<String>) -> Self {
        RuleParamError {
            rule_type: rule_type.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by governance operations.
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Malformed or missing request fields
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Optimistic review update lost against a newer version
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    RuleParam(#[from] RuleParamError),

    /// Backing store failed during a request
    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl GovernanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        GovernanceError::Validation(message.into())
    }

    pub fn decision_not_found() -> Self {
        GovernanceError::NotFound("Decision not found".to_string())
    }

    /// Stable discriminator for error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            GovernanceError::Validation(_) => "VALIDATION_ERROR",
            GovernanceError::NotFound(_) => "NOT_FOUND",
            GovernanceError::Conflict(_) => "CONFLICT",
            GovernanceError::RuleParam(_) => "RULE_PARAM_ERROR",
            GovernanceError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<anyhow::Error> for GovernanceError {
    fn from(err: anyhow::Error) -> Self {
        GovernanceError::Storage(err)
    }
}
