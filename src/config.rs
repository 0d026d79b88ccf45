//! Runtime and compiler settings.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("allocator.span_entries must be at least 1")]
    EmptySpan,
}

/// Settings for one [`Vm`](crate::runtime::vm::Vm).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Emit a trace event for every executed instruction.
    pub trace: bool,
    pub compile: CompileOptions,
    pub allocator: AllocatorConfig,
}

impl VmConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: VmConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allocator.span_entries == 0 {
            return Err(ConfigError::EmptySpan);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub inline: bool,
    /// Calls inlined into one unit before the inliner stops.
    pub max_inlined_calls: usize,
    /// Procedures longer than this are never inlined.
    pub max_inline_len: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            inline: true,
            max_inlined_calls: 4,
            max_inline_len: 32,
        }
    }
}

impl CompileOptions {
    pub fn without_inlining() -> Self {
        Self {
            inline: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Frames created each time a size class runs dry.
    pub span_entries: usize,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self { span_entries: 16 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = VmConfig::from_json(r#"{"compile": {"inline": false}}"#).unwrap();
        assert!(!config.trace);
        assert!(!config.compile.inline);
        assert_eq!(config.compile.max_inlined_calls, 4);
        assert_eq!(config.allocator.span_entries, 16);
    }

    #[test]
    fn rejects_empty_spans() {
        let err = VmConfig::from_json(r#"{"allocator": {"span_entries": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptySpan));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            VmConfig::from_json("{trace: yes}"),
            Err(ConfigError::Json(_))
        ));
    }
}
