//! Sandbox and editor configuration.
//!
//! Both structs deserialize from JSON with every field optional; missing
//! fields take the defaults below.

use std::path::Path;

use jsplay_eval::Limits;
use serde::{Deserialize, Serialize};

use crate::error::SandboxError;

/// Output for a run that succeeded without producing a log line.
pub const SUCCESS_PLACEHOLDER: &str = "코드가 성공적으로 실행되었습니다.";
/// Prefix of a failed run's error text.
pub const ERROR_PREFIX: &str = "실행 오류: ";
/// Output pane text before anything has run.
pub const NOT_RUN_PLACEHOLDER: &str = "아직 코드가 실행되지 않았습니다.";

pub const DEFAULT_TITLE: &str = "코드 편집기";
pub const DEFAULT_CODE: &str = "// 여기에 코드를 작성하세요\nconsole.log('Hello World!');";
pub const DEFAULT_LANGUAGE: &str = "javascript";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub gas_limit: u64,
    pub max_call_depth: usize,
    pub success_placeholder: String,
    pub error_prefix: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            gas_limit: limits.gas_limit,
            max_call_depth: limits.max_call_depth,
            success_placeholder: SUCCESS_PLACEHOLDER.to_string(),
            error_prefix: ERROR_PREFIX.to_string(),
        }
    }
}

impl SandboxConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            gas_limit: self.gas_limit,
            max_call_depth: self.max_call_depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub title: String,
    pub initial_code: String,
    pub language: String,
    pub sandbox: SandboxConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            initial_code: DEFAULT_CODE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            sandbox: SandboxConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, SandboxError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SandboxError> {
        let text = std::fs::read_to_string(path).map_err(|source| SandboxError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(EditorConfig::from_json("{}").unwrap(), EditorConfig::default());
    }

    #[test]
    fn partial_sandbox_section() {
        let config = EditorConfig::from_json(r#"{"title":"t","sandbox":{"gas_limit":500}}"#).unwrap();
        assert_eq!(config.title, "t");
        assert_eq!(config.language, DEFAULT_LANGUAGE);
        assert_eq!(config.sandbox.gas_limit, 500);
        assert_eq!(config.sandbox.max_call_depth, Limits::default().max_call_depth);
        assert_eq!(config.sandbox.error_prefix, ERROR_PREFIX);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = EditorConfig::from_json("{").unwrap_err();
        assert!(matches!(err, SandboxError::Config(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EditorConfig::load(Path::new("/nonexistent/jsplay.json")).unwrap_err();
        assert!(matches!(err, SandboxError::Io { .. }));
    }
}
