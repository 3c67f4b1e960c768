//! Configuration management for the LINE relay
//!
//! Values are layered: environment variables override the TOML config file,
//! which overrides built-in defaults.

mod file;

use std::path::{Path, PathBuf};

use secrecy::SecretString;

pub use file::{
    BeaconLineConfigFile, LineFileConfig, LlmFileConfig, SearchFileConfig, ServerFileConfig,
    config_file_path, load_config_file,
};

use crate::api::webhooks::line::DEFAULT_FALLBACK_MESSAGE;
use crate::llm::openai::DEFAULT_BASE_URL;
use crate::tools::SearchProvider;
use crate::{Error, Result};

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default completion token cap
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Relay configuration
#[derive(Debug)]
pub struct Config {
    /// LINE channel configuration
    pub line: LineConfig,

    /// Chat model configuration
    pub llm: LlmConfig,

    /// Web search configuration
    pub search: SearchConfig,

    /// HTTP server configuration
    pub server: ServerConfig,
}

/// LINE channel configuration
#[derive(Debug)]
pub struct LineConfig {
    /// Channel secret for webhook signatures (`LINE_CHANNEL_SECRET`)
    pub channel_secret: Option<SecretString>,

    /// Channel access token for replies (`LINE_CHANNEL_ACCESS_TOKEN`)
    pub access_token: Option<SecretString>,

    /// Only answer messages starting with this prefix (`LINE_TRIGGER_PREFIX`)
    pub trigger_prefix: Option<String>,

    /// Reply sent when answering fails (`LINE_FALLBACK_MESSAGE`)
    pub fallback_message: String,

    /// Override for the reply endpoint
    pub reply_url: Option<String>,
}

/// Chat model configuration
#[derive(Debug)]
pub struct LlmConfig {
    /// API key (`OPENAI_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Chat completions base URL (`OPENAI_BASE_URL`)
    pub base_url: String,

    /// Model identifier (`OPENAI_MODEL`)
    pub model: String,

    /// Completion token cap (`OPENAI_MAX_TOKENS`)
    pub max_tokens: u32,
}

/// Web search configuration
#[derive(Debug)]
pub struct SearchConfig {
    /// Provider (`SEARCH_PROVIDER`)
    pub provider: SearchProvider,

    /// Provider API key (`SEARCH_API_KEY`, falling back to `TAVILY_API_KEY`)
    ///
    /// Optional: without it the search tool reports an error to the model.
    pub api_key: Option<SecretString>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Port to listen on (`PORT`)
    pub port: u16,
}

/// Default config file location
///
/// Uses `~/.config/omni/beacon-line/config.toml` on Linux
#[must_use]
pub fn default_config_path() -> PathBuf {
    config_file_path().unwrap_or_else(|| PathBuf::from("beacon-line.toml"))
}

impl Config {
    /// Load configuration from the environment and the default config file
    ///
    /// # Errors
    ///
    /// Returns error if an environment value is malformed
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load configuration from the environment and an explicit config file
    ///
    /// # Errors
    ///
    /// Returns error if an environment value is malformed
    pub fn load_from(path: &Path) -> Result<Self> {
        let file = load_config_file(path);
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge a config file with an environment lookup
    ///
    /// Blank environment values count as unset.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric value or the search provider is malformed
    pub fn from_sources(file: BeaconLineConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let secret = |value: Option<String>| value.map(SecretString::from);

        let line = LineConfig {
            channel_secret: secret(var("LINE_CHANNEL_SECRET").or(file.line.channel_secret)),
            access_token: secret(var("LINE_CHANNEL_ACCESS_TOKEN").or(file.line.access_token)),
            trigger_prefix: var("LINE_TRIGGER_PREFIX")
                .or(file.line.trigger_prefix)
                .filter(|p| !p.trim().is_empty()),
            fallback_message: var("LINE_FALLBACK_MESSAGE")
                .or(file.line.fallback_message)
                .unwrap_or_else(|| DEFAULT_FALLBACK_MESSAGE.to_string()),
            reply_url: file.line.reply_url,
        };

        let max_tokens = match var("OPENAI_MAX_TOKENS") {
            Some(v) => parse_number("OPENAI_MAX_TOKENS", &v)?,
            None => file.llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };

        let llm = LlmConfig {
            api_key: secret(var("OPENAI_API_KEY").or(file.llm.api_key)),
            base_url: var("OPENAI_BASE_URL")
                .or(file.llm.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: var("OPENAI_MODEL")
                .or(file.llm.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
        };

        let provider = match var("SEARCH_PROVIDER") {
            Some(name) => SearchProvider::from_name(&name)
                .ok_or_else(|| Error::Config(format!("unknown SEARCH_PROVIDER: {name}")))?,
            None => file.search.provider.unwrap_or_default(),
        };

        let search = SearchConfig {
            provider,
            api_key: secret(
                var("SEARCH_API_KEY")
                    .or_else(|| var("TAVILY_API_KEY"))
                    .or(file.search.api_key),
            ),
        };

        let port = match var("PORT") {
            Some(v) => parse_number("PORT", &v)?,
            None => file.server.port.unwrap_or(DEFAULT_PORT),
        };

        let server = ServerConfig {
            host: file.server.host.unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        };

        Ok(Self {
            line,
            llm,
            search,
            server,
        })
    }

    /// Check that every required credential is present
    ///
    /// # Errors
    ///
    /// Returns a config error naming every missing key
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("LINE_CHANNEL_SECRET", self.line.channel_secret.is_none()),
            ("LINE_CHANNEL_ACCESS_TOKEN", self.line.access_token.is_none()),
            ("OPENAI_API_KEY", self.llm.api_key.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )))
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid {key}: {value}")))
}
