use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use quiz_core::FeedbackMode;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "quiz_terminal.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    /// `None` or zero keeps feedback on screen until the user moves on.
    pub auto_advance_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "https://qa-backend-v2gq.onrender.com".into(),
            auto_advance_ms: None,
        }
    }
}

impl Settings {
    pub fn feedback_mode(&self) -> FeedbackMode {
        match self.auto_advance_ms {
            Some(ms) if ms > 0 => FeedbackMode::AutoAdvance(Duration::from_millis(ms)),
            _ => FeedbackMode::Manual,
        }
    }

    pub fn server_url(&self) -> anyhow::Result<Url> {
        Url::parse(self.server_url.trim())
            .with_context(|| format!("invalid quiz server url '{}'", self.server_url))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    auto_advance_ms: Option<u64>,
}

/// Defaults, then the config file, then environment variables.
///
/// A missing default config file is fine; a missing file that was named
/// explicitly is an error.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, explicit) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?,
        Err(err) if explicit => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.auto_advance_ms {
        settings.auto_advance_ms = Some(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("QUIZ_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    for key in ["QUIZ_AUTO_ADVANCE_MS", "APP__AUTO_ADVANCE_MS"] {
        if let Some(v) = lookup(key) {
            if let Ok(parsed) = v.trim().parse::<u64>() {
                settings.auto_advance_ms = Some(parsed);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
