use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "deckconf.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub device_name: String,
    /// Layout of the simulated device, in component-count reply order.
    pub component_counts: Vec<u16>,
    pub request_timeout_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/deckconf.db".into(),
            device_name: "Deck 32".into(),
            component_counts: vec![32, 8, 8, 32, 4],
            request_timeout_ms: 1500,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    device_name: Option<String>,
    component_counts: Option<Vec<u16>>,
    request_timeout_ms: Option<u64>,
    log_filter: Option<String>,
}

/// Defaults, then the config file if it parses, then environment overrides.
pub fn load_settings(config_path: &Path) -> Settings {
    let file = fs::read_to_string(config_path).ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(file_cfg) = file.and_then(|raw| toml::from_str::<FileSettings>(raw).ok()) {
        if let Some(v) = file_cfg.database_url {
            settings.database_url = v;
        }
        if let Some(v) = file_cfg.device_name {
            settings.device_name = v;
        }
        if let Some(v) = file_cfg.component_counts {
            settings.component_counts = v;
        }
        if let Some(v) = file_cfg.request_timeout_ms {
            settings.request_timeout_ms = v;
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
    }

    let lookup = |name: &str| env(&format!("DECKCONF_{name}")).or_else(|| env(&format!("APP__{name}")));

    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("DEVICE_NAME") {
        settings.device_name = v;
    }
    if let Some(v) = lookup("COMPONENT_COUNTS") {
        let parsed = v
            .split(',')
            .map(|count| count.trim().parse::<u16>())
            .collect::<Result<Vec<_>, _>>();
        if let Ok(counts) = parsed {
            settings.component_counts = counts;
        }
    }
    if let Some(v) = lookup("REQUEST_TIMEOUT_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_ms = parsed;
        }
    }
    if let Some(v) = lookup("LOG") {
        settings.log_filter = v;
    }

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

pub(crate) fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
