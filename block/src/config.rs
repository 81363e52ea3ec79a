use std::time::Duration;

use shared_types::{resolve_model, ModelInfo};

pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct BlockConfig {
    /// Quiet window before a debounced edit is saved
    pub save_debounce: Duration,
    /// Save pending content when a block closes
    pub flush_on_close: bool,
    /// Chat model used for document generation
    pub model: ModelInfo,
    /// Owner recorded on new snapshots
    pub user_id: String,
    /// Document opened by the CLI
    pub document_id: String,
    pub document_title: String,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(DEFAULT_SAVE_DEBOUNCE_MS),
            flush_on_close: true,
            model: resolve_model(shared_types::DEFAULT_MODEL_ID),
            user_id: "local-user".to_string(),
            document_id: "demo".to_string(),
            document_title: "Untitled".to_string(),
        }
    }
}

impl BlockConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let model_id = env_str("BLOCK_MODEL", &defaults.model.id);
        let model = resolve_model(&model_id);
        if model.id != model_id {
            tracing::warn!(requested = %model_id, using = %model.id, "Unknown model; using default");
        }

        Ok(Self {
            save_debounce: Duration::from_millis(env_parse(
                "BLOCK_SAVE_DEBOUNCE_MS",
                DEFAULT_SAVE_DEBOUNCE_MS,
            )?),
            flush_on_close: env_bool("BLOCK_FLUSH_ON_CLOSE", defaults.flush_on_close)?,
            model,
            user_id: env_str("BLOCK_USER_ID", &defaults.user_id),
            document_id: env_str("BLOCK_DOCUMENT_ID", &defaults.document_id),
            document_title: env_str("BLOCK_DOCUMENT_TITLE", &defaults.document_title),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow::anyhow!("Failed to parse env var {key}={val}: expected a boolean")),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(env_str("BLOCK_TEST_UNSET_STR", "fallback"), "fallback");
        assert_eq!(env_parse("BLOCK_TEST_UNSET_NUM", 42u64).unwrap(), 42);
        assert!(env_bool("BLOCK_TEST_UNSET_BOOL", true).unwrap());
    }

    #[test]
    fn test_parse_error_names_variable() {
        std::env::set_var("BLOCK_TEST_BAD_NUM", "soon");
        let err = env_parse::<u64>("BLOCK_TEST_BAD_NUM", 1).unwrap_err();
        assert!(err.to_string().contains("BLOCK_TEST_BAD_NUM=soon"));
    }

    #[test]
    fn test_bool_spellings() {
        std::env::set_var("BLOCK_TEST_BOOL_OFF", "Off");
        std::env::set_var("BLOCK_TEST_BOOL_ON", "1");
        std::env::set_var("BLOCK_TEST_BOOL_BAD", "maybe");
        assert!(!env_bool("BLOCK_TEST_BOOL_OFF", true).unwrap());
        assert!(env_bool("BLOCK_TEST_BOOL_ON", false).unwrap());
        assert!(env_bool("BLOCK_TEST_BOOL_BAD", false).is_err());
    }

    #[test]
    fn test_default_config() {
        let config = BlockConfig::default();
        assert_eq!(config.save_debounce, Duration::from_millis(2000));
        assert!(config.flush_on_close);
        assert_eq!(config.model.api_identifier, "gpt-4o-mini");
        assert_eq!(config.user_id, "local-user");
    }
}
