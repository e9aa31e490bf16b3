//! Error types for the print orchestrator
//!
//! Every variant's display text doubles as the user-visible failure message
//! carried by [`crate::PrintResult`].

use thiserror::Error;

/// Print orchestration error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrintError {
    /// The content reference resolved to no node
    #[error("Print content not found")]
    ContentNotFound,

    /// The staging surface, its document or its window could not be obtained
    #[error("Print frame unavailable: {0}")]
    StagingUnavailable(String),

    /// The staging surface reported an error while rendering
    #[error("Print frame failed to load: {0}")]
    LoadFailure(String),

    /// The platform print trigger raised an error
    #[error("Print failed: {0}")]
    TriggerFailure(String),

    /// The deadline (milliseconds) elapsed before the print dialog was triggered
    #[error("Print timed out after {0}ms")]
    Timeout(u64),

    /// Invalid orchestrator configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PrintError {
    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContentNotFound => "content_not_found",
            Self::StagingUnavailable(_) => "staging_unavailable",
            Self::LoadFailure(_) => "load_failure",
            Self::TriggerFailure(_) => "trigger_failure",
            Self::Timeout(_) => "timeout",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_duration() {
        let err = PrintError::Timeout(2500);
        assert_eq!(err.to_string(), "Print timed out after 2500ms");
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_messages_are_never_empty() {
        let errors = [
            PrintError::ContentNotFound,
            PrintError::StagingUnavailable("no window".into()),
            PrintError::LoadFailure("net::ERR".into()),
            PrintError::TriggerFailure("blocked".into()),
            PrintError::Timeout(1),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
