use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

use crate::controller::flow::DEFAULT_CLOSE_BUTTON_DELAY;

const DEFAULT_SETTINGS_FILE: &str = "paywall.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub catalog_url: Option<String>,
    pub catalog_api_key: Option<String>,
    pub close_button_delay_ms: u64,
    pub demo_monthly_price: String,
    pub demo_yearly_price: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_url: None,
            catalog_api_key: None,
            close_button_delay_ms: DEFAULT_CLOSE_BUTTON_DELAY.as_millis() as u64,
            demo_monthly_price: "$4.99".into(),
            demo_yearly_price: "$22.99".into(),
        }
    }
}

impl Settings {
    pub fn close_button_delay(&self) -> Duration {
        Duration::from_millis(self.close_button_delay_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    catalog_url: Option<String>,
    catalog_api_key: Option<String>,
    close_button_delay_ms: Option<u64>,
    demo_monthly_price: Option<String>,
    demo_yearly_price: Option<String>,
}

/// Defaults, then the settings file, then `APP__*` environment overrides.
///
/// An explicit `path` must exist; the default `paywall.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            apply_file_settings(&mut settings, file_cfg);
        }
        Err(err) if required => {
            return Err(anyhow::Error::new(err)
                .context(format!("failed to read settings file '{}'", path.display())));
        }
        Err(_) => {}
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.catalog_url {
        settings.catalog_url = Some(v);
    }
    if let Some(v) = file_cfg.catalog_api_key {
        settings.catalog_api_key = Some(v);
    }
    if let Some(v) = file_cfg.close_button_delay_ms {
        settings.close_button_delay_ms = v;
    }
    if let Some(v) = file_cfg.demo_monthly_price {
        settings.demo_monthly_price = v;
    }
    if let Some(v) = file_cfg.demo_yearly_price {
        settings.demo_yearly_price = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__CATALOG_URL") {
        settings.catalog_url = Some(v);
    }
    if let Some(v) = var("APP__CATALOG_API_KEY") {
        settings.catalog_api_key = Some(v);
    }
    if let Some(v) = var("APP__CLOSE_BUTTON_DELAY_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.close_button_delay_ms = parsed;
        }
    }
    if let Some(v) = var("APP__DEMO_MONTHLY_PRICE") {
        settings.demo_monthly_price = v;
    }
    if let Some(v) = var("APP__DEMO_YEARLY_PRICE") {
        settings.demo_yearly_price = v;
    }
}
