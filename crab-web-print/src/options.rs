//! Per-call options, the result record and orchestrator configuration

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PrintError;
use crate::format::PrintFormat;

/// Default overall deadline for one print operation
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

type StartHook<'a> = Box<dyn FnOnce() + 'a>;
type MessageHook<'a> = Box<dyn FnOnce(&str) + 'a>;

/// Callbacks and deadline for a single print call
///
/// `on_start` fires once staging begins, then exactly one of `on_success`
/// or `on_error` fires before the call returns.
#[derive(Default)]
pub struct PrintOptions<'a> {
    on_start: Option<StartHook<'a>>,
    on_success: Option<MessageHook<'a>>,
    on_error: Option<MessageHook<'a>>,
    timeout: Option<Duration>,
}

impl<'a> PrintOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl FnOnce() + 'a) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_success(mut self, f: impl FnOnce(&str) + 'a) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&str) + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Override the overall deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_timeout_ms(self, ms: u64) -> Self {
        self.with_timeout(Duration::from_millis(ms))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn start(&mut self) {
        if let Some(f) = self.on_start.take() {
            f();
        }
    }

    pub(crate) fn succeed(mut self, message: String) -> PrintResult {
        if let Some(f) = self.on_success.take() {
            f(&message);
        }
        PrintResult::succeeded(message)
    }

    pub(crate) fn fail(mut self, error: PrintError) -> PrintResult {
        let result = PrintResult::failed(&error);
        if let Some(f) = self.on_error.take() {
            f(&result.message);
        }
        result
    }
}

impl fmt::Debug for PrintOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrintOptions")
            .field("on_start", &self.on_start.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Outcome of one print call
///
/// On failure `error` and `message` carry the same text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl PrintResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            message: message.into(),
        }
    }

    pub fn failed(error: &PrintError) -> Self {
        let message = error.to_string();
        Self {
            success: false,
            error: Some(message.clone()),
            message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl From<PrintError> for PrintResult {
    fn from(error: PrintError) -> Self {
        Self::failed(&error)
    }
}

/// Orchestrator-wide defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    /// Format used by [`crate::PrintOrchestrator::print`]
    pub default_format: PrintFormat,
    /// Deadline applied when a call sets no timeout of its own
    pub timeout_ms: u64,
}

impl PrintConfig {
    /// Parse from JSON; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, PrintError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PrintError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PrintError> {
        if self.timeout_ms == 0 {
            return Err(PrintError::InvalidConfig(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            default_format: PrintFormat::A4,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_failed_result_mirrors_message() {
        let result = PrintResult::failed(&PrintError::ContentNotFound);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(result.message.as_str()));
        assert!(!result.message.is_empty());
    }

    #[test]
    fn test_result_json_shape() {
        let ok = serde_json::to_value(PrintResult::succeeded("done")).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true, "message": "done" }));

        let err = serde_json::to_value(PrintResult::from(PrintError::Timeout(10))).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "Print timed out after 10ms");
        assert_eq!(err["message"], err["error"]);
    }

    #[test]
    fn test_hooks_fire_once() {
        let calls = RefCell::new(Vec::new());
        let mut options = PrintOptions::new()
            .on_start(|| calls.borrow_mut().push("start".to_string()))
            .on_error(|msg| calls.borrow_mut().push(format!("error: {}", msg)));

        options.start();
        options.start();
        let result = options.fail(PrintError::TriggerFailure("blocked".into()));

        assert!(!result.success);
        assert_eq!(
            *calls.borrow(),
            vec!["start".to_string(), "error: Print failed: blocked".to_string()]
        );
    }

    #[test]
    fn test_config_defaults() {
        let config = PrintConfig::default();
        assert_eq!(config.default_format, PrintFormat::A4);
        assert_eq!(config.timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_config_from_json() {
        let config = PrintConfig::from_json(r#"{ "default_format": "thermal" }"#).unwrap();
        assert_eq!(config.default_format, PrintFormat::Thermal);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);

        let err = PrintConfig::from_json(r#"{ "timeout_ms": 0 }"#).unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
        assert!(PrintConfig::from_json("not json").is_err());
    }
}
