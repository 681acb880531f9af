//! Application configuration loading and validation.
//!
//! Reads `mcp-chat.yaml` and resolves environment variables. Every field has
//! a default, so an empty file (or no file at all) yields a working setup
//! pointed at a local tool backend and the public OpenAI endpoint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// File name searched for when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "mcp-chat.yaml";

/// Environment variable that may point at the config file.
pub const CONFIG_ENV_VAR: &str = "MCP_CHAT_CONFIG";

/// Default system prompt seeded at the start of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant that helps users understand their Microsoft Azure tenant. You can access information about application registrations through functions. Always be helpful, concise, and accurate.";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not find {file_name}")]
    NotFound { file_name: String },

    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse {
            reason: e.to_string(),
        }
    }
}

// ─── Public Types ────────────────────────────────────────────────────────────

/// Top-level configuration (mirrors `mcp-chat.yaml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub tool_backend: ToolBackendConfig,
    pub orchestrator: OrchestratorConfig,
}

/// Language model endpoint settings.
///
/// A `base_url` containing `openai.azure.com` switches the client to the
/// Azure deployment URL scheme and `api-key` header.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    /// Model sent to non-Azure endpoints.
    pub model_name: String,
    /// Deployment used on Azure endpoints.
    pub deployment_name: String,
    pub api_version: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model_name: "gpt-3.5-turbo".into(),
            deployment_name: "gpt-35-turbo".into(),
            api_version: "2023-07-01-preview".into(),
            temperature: None,
            max_tokens: None,
            timeout_secs: 60,
        }
    }
}

/// Function backend settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolBackendConfig {
    pub base_url: String,
    pub catalog_timeout_secs: u64,
    pub execute_timeout_secs: u64,
    pub status_timeout_secs: u64,
}

impl Default for ToolBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            catalog_timeout_secs: 10,
            execute_timeout_secs: 30,
            status_timeout_secs: 5,
        }
    }
}

impl ToolBackendConfig {
    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }
}

/// Orchestration loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Deadline for one user turn, covering every catalog, tool and model call.
    pub session_deadline_secs: u64,
    /// Tool rounds allowed per turn. `1` follows up once and ignores any
    /// further tool directive.
    pub max_tool_rounds: u32,
    /// Run the calls of one directive concurrently.
    pub parallel_tool_calls: bool,
    /// Send `name` on function-role messages.
    pub include_function_names: bool,
    pub system_prompt: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            session_deadline_secs: 60,
            max_tool_rounds: 1,
            parallel_tool_calls: false,
            include_function_names: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
        }
    }
}

impl OrchestratorConfig {
    pub fn session_deadline(&self) -> Duration {
        Duration::from_secs(self.session_deadline_secs)
    }
}

impl AppConfig {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "model.base_url must not be empty".into(),
            });
        }
        if self.tool_backend.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "tool_backend.base_url must not be empty".into(),
            });
        }
        if self.orchestrator.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid {
                reason: "orchestrator.max_tool_rounds must be at least 1".into(),
            });
        }
        if self.orchestrator.session_deadline_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "orchestrator.session_deadline_secs must be positive".into(),
            });
        }
        Ok(())
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// Lookup order: `explicit` (from `--config`), then `MCP_CHAT_CONFIG`, then
/// `mcp-chat.yaml` in `start` or any of its ancestors.
pub fn find_config_path(explicit: Option<&Path>, start: &Path) -> Result<PathBuf, ConfigError> {
    // 1. Explicit path must exist
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ConfigError::Read {
            path: path.display().to_string(),
            reason: "file does not exist".into(),
        });
    }

    // 2. Env var
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(expand_tilde(&path));
        if candidate.exists() {
            return Ok(candidate);
        }
        tracing::warn!(path = %candidate.display(), "MCP_CHAT_CONFIG points at a missing file");
    }

    // 3. Walk upward from `start`
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(ConfigError::NotFound {
        file_name: CONFIG_FILE_NAME.into(),
    })
}

/// Load, interpolate and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_config(&raw)
}

/// Parse config text. Blank input yields the defaults.
pub fn parse_config(raw: &str) -> Result<AppConfig, ConfigError> {
    let interpolated = interpolate_env_vars(raw);
    let config: AppConfig = if interpolated.trim().is_empty() {
        AppConfig::default()
    } else {
        serde_yaml::from_str(&interpolated)?
    };
    config.validate()?;
    Ok(config)
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve `VAR` or `VAR:-default`. Unset variables without a default become "".
fn resolve_var_expr(expr: &str) -> String {
    match expr.split_once(":-") {
        Some((var_name, default)) => std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default)),
        None => std::env::var(expr).unwrap_or_default(),
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.model.model_name, "gpt-3.5-turbo");
        assert_eq!(config.model.deployment_name, "gpt-35-turbo");
        assert_eq!(config.tool_backend.catalog_timeout(), Duration::from_secs(10));
        assert_eq!(config.tool_backend.execute_timeout(), Duration::from_secs(30));
        assert_eq!(config.tool_backend.status_timeout(), Duration::from_secs(5));
        assert_eq!(config.orchestrator.session_deadline(), Duration::from_secs(60));
        assert_eq!(config.orchestrator.max_tool_rounds, 1);
        assert!(!config.orchestrator.parallel_tool_calls);
        assert!(config.orchestrator.include_function_names);
        assert_eq!(config.orchestrator.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
            model:
              base_url: "https://contoso.openai.azure.com"
              deployment_name: "gpt-4o"
            orchestrator:
              max_tool_rounds: 3
        "#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.model.deployment_name, "gpt-4o");
        assert_eq!(config.model.api_version, "2023-07-01-preview");
        assert_eq!(config.orchestrator.max_tool_rounds, 3);
        assert_eq!(config.orchestrator.session_deadline_secs, 60);
        assert_eq!(config.tool_backend.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_zero_rounds_rejected() {
        let yaml = "orchestrator:\n  max_tool_rounds: 0\n";
        let err = parse_config(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_bad_yaml_rejected() {
        let err = parse_config("model: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_interpolate_env_vars_with_default() {
        std::env::remove_var("__MCP_CHAT_TEST_UNSET__");
        let result = interpolate_env_vars("${__MCP_CHAT_TEST_UNSET__:-/fallback/path}");
        assert_eq!(result, "/fallback/path");
    }

    #[test]
    fn test_interpolate_env_vars_with_value() {
        std::env::set_var("__MCP_CHAT_TEST_KEY__", "sk-test");
        let config = parse_config("model:\n  api_key: \"${__MCP_CHAT_TEST_KEY__}\"\n").unwrap();
        assert_eq!(config.model.api_key, "sk-test");
        std::env::remove_var("__MCP_CHAT_TEST_KEY__");
    }

    #[test]
    fn test_interpolate_no_vars() {
        let input = "plain text with no variables";
        assert_eq!(interpolate_env_vars(input), input);
    }

    #[test]
    fn test_expand_tilde() {
        let result = expand_tilde("~/config");
        assert!(!result.starts_with('~'), "tilde should be expanded");
        assert!(result.ends_with("/config"));
    }

    #[test]
    fn test_find_config_walks_upward() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = find_config_path(None, &nested).unwrap();
        assert_eq!(found, root.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_find_config_explicit_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = find_config_path(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "tool_backend:\n  base_url: \"http://tools.internal:8080\"\n  execute_timeout_secs: 12\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.tool_backend.base_url, "http://tools.internal:8080");
        assert_eq!(config.tool_backend.execute_timeout(), Duration::from_secs(12));
    }
}
