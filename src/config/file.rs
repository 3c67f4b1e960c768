//! TOML configuration file loading
//!
//! Supports `~/.config/omni/beacon-line/config.toml` as a persistent config
//! source. All fields are optional; the file is a partial overlay on top of
//! defaults and is itself overridden by environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;
use crate::tools::SearchProvider;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct BeaconLineConfigFile {
    /// LINE channel configuration
    #[serde(default)]
    pub line: LineFileConfig,

    /// Chat model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchFileConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// LINE channel configuration
#[derive(Debug, Default, Deserialize)]
pub struct LineFileConfig {
    pub channel_secret: Option<String>,
    pub access_token: Option<String>,
    /// Only answer messages starting with this prefix
    pub trigger_prefix: Option<String>,
    /// Reply sent when answering fails
    pub fallback_message: Option<String>,
    /// Reply endpoint override (API-compatible proxy)
    pub reply_url: Option<String>,
}

/// Chat model configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    pub api_key: Option<String>,
    /// Chat completions base URL (e.g. "https://api.openai.com/v1")
    pub base_url: Option<String>,
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

/// Web search configuration
#[derive(Debug, Default, Deserialize)]
pub struct SearchFileConfig {
    /// "tavily", "brave", or "serper"
    pub provider: Option<SearchProvider>,
    pub api_key: Option<String>,
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Bind address (default "0.0.0.0")
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl BeaconLineConfigFile {
    /// Parse a config file from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if the text is not valid TOML for this schema
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Load a TOML config file
///
/// Returns `BeaconLineConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file(path: &Path) -> BeaconLineConfigFile {
    if !path.exists() {
        return BeaconLineConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match BeaconLineConfigFile::parse(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                BeaconLineConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            BeaconLineConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/omni/beacon-line/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("omni")
            .join("beacon-line")
            .join("config.toml")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let file = BeaconLineConfigFile::parse(
            r#"
            [llm]
            model = "gpt-4o"

            [search]
            provider = "serper"
            "#,
        )
        .unwrap();

        assert_eq!(file.llm.model.as_deref(), Some("gpt-4o"));
        assert!(file.llm.max_tokens.is_none());
        assert_eq!(file.search.provider, Some(SearchProvider::Serper));
        assert!(file.line.channel_secret.is_none());
        assert!(file.server.port.is_none());
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(BeaconLineConfigFile::parse("[search]\nprovider = \"bing\"").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let file = load_config_file(Path::new("/nonexistent/beacon-line/config.toml"));
        assert!(file.llm.model.is_none());
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = \"not a number\"").unwrap();

        let file = load_config_file(&path);
        assert!(file.server.port.is_none());
    }

    #[test]
    fn valid_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9000\n\n[line]\ntrigger_prefix = \"@bot\"").unwrap();

        let file = load_config_file(&path);
        assert_eq!(file.server.port, Some(9000));
        assert_eq!(file.line.trigger_prefix.as_deref(), Some("@bot"));
    }

    #[test]
    fn config_path_ends_with_app_dir() {
        if let Some(path) = config_file_path() {
            assert!(path.ends_with("omni/beacon-line/config.toml"));
        }
    }
}
