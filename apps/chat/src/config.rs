use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::protocol::GET_RESPONSE_PATH;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "lingobot.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub endpoint_path: String,
    /// `None` disables the request timeout.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            endpoint_path: GET_RESPONSE_PATH.into(),
            request_timeout_secs: Some(30),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Applies whichever values are present; a timeout of zero disables it.
    pub fn override_with(
        &mut self,
        server_url: Option<String>,
        endpoint_path: Option<String>,
        request_timeout_secs: Option<u64>,
    ) {
        if let Some(v) = server_url {
            self.server_url = v;
        }
        if let Some(v) = endpoint_path {
            self.endpoint_path = v;
        }
        if let Some(v) = request_timeout_secs {
            self.request_timeout_secs = (v > 0).then_some(v);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    endpoint_path: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the TOML file, then environment overrides.
///
/// Without an explicit `config_path`, `lingobot.toml` in the working
/// directory is read if it exists. An explicit path must exist.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    match fs::read_to_string(&path) {
        Ok(raw) => apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if !required && err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    settings.override_with(
        file_cfg.server_url,
        file_cfg.endpoint_path,
        file_cfg.request_timeout_secs,
    );
    Ok(())
}

/// `APP__*` keys win over the bare `LINGOBOT_*` ones.
pub fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let first_of = |keys: &[&str]| keys.iter().find_map(|key| lookup(*key));

    let server_url = first_of(&["APP__SERVER_URL", "LINGOBOT_SERVER_URL"]);
    let endpoint_path = first_of(&["APP__ENDPOINT_PATH", "LINGOBOT_ENDPOINT_PATH"]);
    let request_timeout_secs = first_of(&["APP__REQUEST_TIMEOUT_SECS", "LINGOBOT_REQUEST_TIMEOUT_SECS"])
        .and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                warn!(value = %raw, %error, "config: ignoring invalid request timeout override");
                None
            }
        });

    settings.override_with(server_url, endpoint_path, request_timeout_secs);
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
