//! Runtime settings, built once at startup from the environment and then
//! passed by reference into each component.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::defaults::{
    default_annotated_path, DEFAULT_AI_MODEL, DEFAULT_CATALOG_PATH, DEFAULT_LOG_LEVEL,
    DEFAULT_OLLAMA_URL, DEFAULT_TV_CLIENT_NAME, DEFAULT_TV_PORT, DEFAULT_TV_TIMEOUT_SECS,
};

pub const ENV_TV_IP: &str = "THEFRAME_TV_IP";
pub const ENV_TV_TOKEN: &str = "THEFRAME_TV_TOKEN";
pub const ENV_TV_PORT: &str = "THEFRAME_TV_PORT";
pub const ENV_TV_TIMEOUT: &str = "THEFRAME_TV_TIMEOUT";
pub const ENV_CATALOG: &str = "THEFRAME_CATALOG";
pub const ENV_IMAGES_DIR: &str = "THEFRAME_IMAGES_DIR";
pub const ENV_BASE_URL: &str = "THEFRAME_BASE_URL";
pub const ENV_OLLAMA_URL: &str = "THEFRAME_OLLAMA_URL";
pub const ENV_AI_MODEL: &str = "THEFRAME_AI_MODEL";
pub const ENV_FONT: &str = "THEFRAME_FONT";
pub const ENV_ANNOTATED_PATH: &str = "THEFRAME_ANNOTATED_PATH";
pub const ENV_LOG_DIR: &str = "THEFRAME_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "THEFRAME_LOG_LEVEL";

/// TheFrame runtime configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// TV address (IP or host name)
    pub tv_ip: Option<String>,
    /// Pairing token issued by the TV
    pub tv_token: Option<String>,
    pub tv_port: u16,
    pub tv_client_name: String,
    pub tv_timeout_secs: u64,
    /// Catalog JSON file
    pub catalog_path: PathBuf,
    /// Directory scanned by `generate`
    pub images_dir: Option<PathBuf>,
    /// Base URL the images directory is served under
    pub base_url: Option<String>,
    pub ollama_url: String,
    pub ai_model: String,
    /// Font tried before the built-in candidate list
    pub font_path: Option<PathBuf>,
    /// Where the annotated image is written
    pub annotated_path: PathBuf,
    pub log_level: String,
    /// Enables rolling NDJSON log files when set
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tv_ip: None,
            tv_token: None,
            tv_port: DEFAULT_TV_PORT,
            tv_client_name: DEFAULT_TV_CLIENT_NAME.to_string(),
            tv_timeout_secs: DEFAULT_TV_TIMEOUT_SECS,
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            images_dir: None,
            base_url: None,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
            font_path: None,
            annotated_path: default_annotated_path(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_dir: None,
        }
    }
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_with(&std::env::vars().collect())
    }

    /// Load settings from a provided variable map (useful for testing).
    ///
    /// Empty values count as unset.
    pub fn from_env_with(env: &HashMap<String, String>) -> Self {
        let var = |name: &str| {
            env.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let defaults = Self::default();

        Self {
            tv_ip: var(ENV_TV_IP),
            tv_token: var(ENV_TV_TOKEN),
            tv_port: var(ENV_TV_PORT)
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.tv_port),
            tv_client_name: defaults.tv_client_name,
            tv_timeout_secs: var(ENV_TV_TIMEOUT)
                .and_then(|t| t.parse().ok())
                .filter(|t| *t > 0)
                .unwrap_or(defaults.tv_timeout_secs),
            catalog_path: var(ENV_CATALOG)
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_path),
            images_dir: var(ENV_IMAGES_DIR).map(PathBuf::from),
            base_url: var(ENV_BASE_URL).map(|u| u.trim_end_matches('/').to_string()),
            ollama_url: var(ENV_OLLAMA_URL)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.ollama_url),
            ai_model: var(ENV_AI_MODEL).unwrap_or(defaults.ai_model),
            font_path: var(ENV_FONT).map(PathBuf::from),
            annotated_path: var(ENV_ANNOTATED_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.annotated_path),
            log_level: var(ENV_LOG_LEVEL)
                .or_else(|| var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            log_dir: var(ENV_LOG_DIR).map(PathBuf::from),
        }
    }

    /// Apply command line overrides on top of the environment.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(ip) = overrides.tv_ip {
            self.tv_ip = Some(ip);
        }
        if let Some(token) = overrides.tv_token {
            self.tv_token = Some(token);
        }
        if let Some(port) = overrides.tv_port {
            self.tv_port = port;
        }
        if let Some(path) = overrides.catalog_path {
            self.catalog_path = path;
        }
        if let Some(dir) = overrides.images_dir {
            self.images_dir = Some(dir);
        }
        if let Some(url) = overrides.base_url {
            self.base_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(model) = overrides.ai_model {
            self.ai_model = model;
        }
        if overrides.debug {
            self.log_level = "debug".to_string();
        }
    }

    pub fn tv_timeout(&self) -> Duration {
        Duration::from_secs(self.tv_timeout_secs)
    }
}

/// Values given on the command line; `None` keeps the environment value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub tv_ip: Option<String>,
    pub tv_token: Option<String>,
    pub tv_port: Option<u16>,
    pub catalog_path: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub ai_model: Option<String>,
    pub debug: bool,
}
