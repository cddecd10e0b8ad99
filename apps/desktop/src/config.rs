use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "desktop.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub login_latency_ms: u64,
    pub contact_latency_ms: u64,
    pub upload_latency_ms: u64,
    pub profile_latency_ms: u64,
    pub operation_timeout_ms: u64,
    pub reports_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            login_latency_ms: 1500,
            contact_latency_ms: 2000,
            upload_latency_ms: 3000,
            profile_latency_ms: 1500,
            operation_timeout_ms: 30_000,
            reports_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    login_latency_ms: Option<u64>,
    contact_latency_ms: Option<u64>,
    upload_latency_ms: Option<u64>,
    profile_latency_ms: Option<u64>,
    operation_timeout_ms: Option<u64>,
    reports_path: Option<PathBuf>,
}

impl Settings {
    pub fn login_latency(&self) -> Duration {
        Duration::from_millis(self.login_latency_ms)
    }

    pub fn contact_latency(&self) -> Duration {
        Duration::from_millis(self.contact_latency_ms)
    }

    pub fn upload_latency(&self) -> Duration {
        Duration::from_millis(self.upload_latency_ms)
    }

    pub fn profile_latency(&self) -> Duration {
        Duration::from_millis(self.profile_latency_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.login_latency_ms {
            self.login_latency_ms = v;
        }
        if let Some(v) = file_cfg.contact_latency_ms {
            self.contact_latency_ms = v;
        }
        if let Some(v) = file_cfg.upload_latency_ms {
            self.upload_latency_ms = v;
        }
        if let Some(v) = file_cfg.profile_latency_ms {
            self.profile_latency_ms = v;
        }
        if let Some(v) = file_cfg.operation_timeout_ms {
            self.operation_timeout_ms = v;
        }
        if let Some(v) = file_cfg.reports_path {
            self.reports_path = Some(v);
        }
    }

    /// Applies `APP__*` overrides. Unparseable numbers are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let millis = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(v) = millis("APP__LOGIN_LATENCY_MS") {
            self.login_latency_ms = v;
        }
        if let Some(v) = millis("APP__CONTACT_LATENCY_MS") {
            self.contact_latency_ms = v;
        }
        if let Some(v) = millis("APP__UPLOAD_LATENCY_MS") {
            self.upload_latency_ms = v;
        }
        if let Some(v) = millis("APP__PROFILE_LATENCY_MS") {
            self.profile_latency_ms = v;
        }
        if let Some(v) = millis("APP__OPERATION_TIMEOUT_MS") {
            self.operation_timeout_ms = v;
        }
        if let Some(v) = lookup("APP__REPORTS_PATH").filter(|v| !v.trim().is_empty()) {
            self.reports_path = Some(PathBuf::from(v));
        }
    }
}

/// Defaults, then the config file (if present), then the environment.
///
/// An explicitly named file must exist; the default file is optional.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => settings.apply_file(parse_file_settings(&raw, path)?),
        Err(err) if explicit.is_none() && err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

fn parse_file_settings(raw: &str, path: &Path) -> anyhow::Result<FileSettings> {
    toml::from_str(raw).with_context(|| format!("invalid config file '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
