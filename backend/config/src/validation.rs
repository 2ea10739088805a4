//! Per-command settings validation with user-friendly error messages.

use std::net::IpAddr;

use theframe_core::FrameError;
use thiserror::Error;

use crate::settings::{
    Settings, ENV_AI_MODEL, ENV_BASE_URL, ENV_CATALOG, ENV_IMAGES_DIR, ENV_OLLAMA_URL, ENV_TV_IP,
    ENV_TV_TOKEN,
};

/// A settings problem tied to the variable (or flag) that controls it.
#[derive(Debug, Error)]
#[error("{setting}: {message}")]
pub struct ConfigValidationError {
    pub setting: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, setting: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            setting: setting.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, setting: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            setting: setting.into(),
            message: message.into(),
        });
    }

    /// Log warnings and turn any errors into a single `FrameError::Config`.
    pub fn into_result(self) -> Result<(), FrameError> {
        for warning in &self.warnings {
            tracing::warn!(setting = %warning.setting, message = %warning.message, "Settings warning");
        }
        if self.errors.is_empty() {
            return Ok(());
        }
        let joined = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(FrameError::Config(joined))
    }
}

/// `upload` needs a TV address, a token, and a catalog.
pub fn validate_for_upload(settings: &Settings) -> ValidationReport {
    let mut report = ValidationReport::default();
    match settings.tv_ip.as_deref() {
        None => report.error(ENV_TV_IP, "TV IP address is required for upload (set it or pass --ip)"),
        Some(ip) if ip.parse::<IpAddr>().is_err() => {
            report.warn(ENV_TV_IP, format!("'{ip}' is not an IP address; treating it as a host name"))
        }
        Some(_) => {}
    }
    if settings.tv_token.is_none() {
        report.error(ENV_TV_TOKEN, "TV token is required for upload (set it or pass --token)");
    }
    validate_catalog_path(settings, &mut report);
    report
}

/// `generate` needs an existing images directory.
pub fn validate_for_generate(settings: &Settings) -> ValidationReport {
    let mut report = ValidationReport::default();
    match &settings.images_dir {
        None => report.error(
            ENV_IMAGES_DIR,
            "images directory is required for generate (set it or pass --images-dir)",
        ),
        Some(dir) if !dir.is_dir() => report.error(
            ENV_IMAGES_DIR,
            format!("images directory {} does not exist", dir.display()),
        ),
        Some(_) => {}
    }
    match settings.base_url.as_deref() {
        None => report.warn(
            ENV_BASE_URL,
            "no base URL set; catalog entries will reference local paths",
        ),
        Some(url) if !is_http_url(url) => {
            report.error(ENV_BASE_URL, format!("'{url}' is not an http(s) URL"))
        }
        Some(_) => {}
    }
    validate_catalog_path(settings, &mut report);
    report
}

/// `populate` needs a reachable-looking inference endpoint and a model name.
pub fn validate_for_populate(settings: &Settings) -> ValidationReport {
    let mut report = ValidationReport::default();
    if !is_http_url(&settings.ollama_url) {
        report.error(
            ENV_OLLAMA_URL,
            format!("'{}' is not an http(s) URL", settings.ollama_url),
        );
    }
    if settings.ai_model.trim().is_empty() {
        report.error(ENV_AI_MODEL, "model name cannot be empty");
    }
    validate_catalog_path(settings, &mut report);
    report
}

pub fn validate_for_errors(settings: &Settings) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_catalog_path(settings, &mut report);
    report
}

fn validate_catalog_path(settings: &Settings, report: &mut ValidationReport) {
    let path = &settings.catalog_path;
    if path.as_os_str().is_empty() {
        report.error(ENV_CATALOG, "catalog path cannot be empty");
        return;
    }
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if !is_json {
        report.warn(ENV_CATALOG, format!("{} does not end in .json", path.display()));
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
