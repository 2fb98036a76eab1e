use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analyzer::Settings;
use crate::error::{Result, ThreadlensError};

/// Main configuration structure for threadlens
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server and outbound client configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Analysis cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Default credential for the one-shot CLI path
    #[serde(default)]
    pub credentials: CredentialsConfig,
    /// Per-provider base URL overrides
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:7171")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Connect timeout for outbound provider calls, in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Overall request timeout for outbound provider calls, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:7171".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// Analysis cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached analyses, one per thread
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    256
}

/// Default credential used by `threadlens analyze`. The API key itself is
/// read from the named environment variable, never from the file.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Provider name: openai, gemini, or claude
    #[serde(default)]
    pub provider: String,
    /// Environment variable name holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model override; each provider has its own default
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            api_key_env: default_api_key_env(),
            model: None,
        }
    }
}

fn default_api_key_env() -> String {
    "THREADLENS_API_KEY".to_string()
}

impl CredentialsConfig {
    /// Resolve the configured credential into per-request settings.
    pub fn resolve(&self) -> Result<Settings> {
        if self.provider.is_empty() {
            return Err(ThreadlensError::Config(
                "No provider configured under [credentials]".to_string(),
            ));
        }

        let api_key = env::var(&self.api_key_env).map_err(|_| {
            ThreadlensError::Config(format!("API key env var '{}' not set", self.api_key_env))
        })?;

        Ok(Settings {
            ai_provider: self.provider.clone(),
            api_key,
            selected_model: self.model.clone(),
        })
    }
}

/// Per-provider base URL overrides, for tests and proxies. Unset providers
/// use their real endpoints.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EndpointsConfig {
    #[serde(default)]
    pub openai: Option<String>,
    #[serde(default)]
    pub gemini: Option<String>,
    #[serde(default)]
    pub claude: Option<String>,
}

impl EndpointsConfig {
    /// Point every provider at the same base URL.
    pub fn all_overridden(base_url: &str) -> Self {
        Self {
            openai: Some(base_url.to_string()),
            gemini: Some(base_url.to_string()),
            claude: Some(base_url.to_string()),
        }
    }
}

/// Load configuration from the first file found: the explicit path, then
/// `~/.threadlens/config.toml`, the platform config dir, and `./config.toml`.
/// No file at all means defaults.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_path {
        tracing::info!("Loading config from: {}", path.display());
        return read_config(path);
    }

    let default_paths = [
        dirs::home_dir().map(|h| h.join(".threadlens").join("config.toml")),
        dirs::config_dir().map(|c| c.join("threadlens").join("config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            tracing::info!("Loading config from: {}", path.display());
            return read_config(path);
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ThreadlensError::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    toml::from_str(&content)
        .map_err(|e| ThreadlensError::Config(format!("Failed to parse config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:7171");
        assert_eq!(config.server.connect_timeout_secs, 10);
        assert_eq!(config.server.request_timeout_secs, 120);
        assert_eq!(config.cache.capacity, 256);
        assert_eq!(config.credentials.provider, "");
        assert_eq!(config.credentials.api_key_env, "THREADLENS_API_KEY");
        assert!(config.credentials.model.is_none());
        assert!(config.endpoints.openai.is_none());
        assert!(config.endpoints.gemini.is_none());
        assert!(config.endpoints.claude.is_none());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[server]
listen_addr = "0.0.0.0:8080"
connect_timeout_secs = 5
request_timeout_secs = 60

[cache]
capacity = 32

[credentials]
provider = "claude"
api_key_env = "ANTHROPIC_API_KEY"
model = "claude-3-sonnet"

[endpoints]
openai = "http://127.0.0.1:9000"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.server.connect_timeout_secs, 5);
        assert_eq!(config.server.request_timeout_secs, 60);
        assert_eq!(config.cache.capacity, 32);
        assert_eq!(config.credentials.provider, "claude");
        assert_eq!(config.credentials.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.credentials.model.as_deref(), Some("claude-3-sonnet"));
        assert_eq!(
            config.endpoints.openai.as_deref(),
            Some("http://127.0.0.1:9000")
        );
        assert!(config.endpoints.gemini.is_none());
    }

    #[test]
    fn test_toml_partial_deserialization() {
        let toml_str = r#"
[credentials]
provider = "openai"
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");

        assert_eq!(config.credentials.provider, "openai");
        assert_eq!(config.credentials.api_key_env, "THREADLENS_API_KEY");
        assert_eq!(config.server.listen_addr, "127.0.0.1:7171");
        assert_eq!(config.cache.capacity, 256);
    }

    #[test]
    fn test_load_config_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\ncapacity = 4\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.cache.capacity, 4);
    }

    #[test]
    fn test_load_config_explicit_path_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ThreadlensError::Config(_))));
    }

    #[test]
    fn test_load_config_invalid_toml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ThreadlensError::Config(_))));
    }

    #[test]
    fn test_credentials_resolve_missing_env_var() {
        unsafe { env::remove_var("THREADLENS_TEST_ABSENT_KEY") };
        let credentials = CredentialsConfig {
            provider: "openai".to_string(),
            api_key_env: "THREADLENS_TEST_ABSENT_KEY".to_string(),
            model: None,
        };

        let err = credentials.resolve().unwrap_err();
        assert!(err.to_string().contains("THREADLENS_TEST_ABSENT_KEY"));
    }

    #[test]
    fn test_credentials_resolve_reads_env_var() {
        unsafe { env::set_var("THREADLENS_TEST_PRESENT_KEY", "sk-test") };
        let credentials = CredentialsConfig {
            provider: "openai".to_string(),
            api_key_env: "THREADLENS_TEST_PRESENT_KEY".to_string(),
            model: Some("gpt-4".to_string()),
        };

        let settings = credentials.resolve().unwrap();
        assert_eq!(settings.ai_provider, "openai");
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.selected_model.as_deref(), Some("gpt-4"));
    }

    #[test]
    fn test_credentials_resolve_without_provider_is_error() {
        let err = CredentialsConfig::default().resolve().unwrap_err();
        assert!(err.to_string().contains("provider"));
    }
}
