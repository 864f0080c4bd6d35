use anyhow::Context;

use std::path::{Path, PathBuf};

/// Persisted user state, one TOML file. Keys are grouped by logical prefix:
/// the `[window]` table holds geometry, `[translate]` holds the last-chosen
/// model/language and the inference endpoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub translate: TranslateSettings,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WindowSettings {
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranslateSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_width() -> i32 {
    480
}

fn default_height() -> i32 {
    360
}

fn default_model() -> String {
    "gemma3:12b".to_string()
}

fn default_target_lang() -> String {
    "ru".to_string()
}

fn default_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            translate: TranslateSettings::default(),
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for TranslateSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            target_lang: default_target_lang(),
            endpoint: default_endpoint(),
        }
    }
}

pub fn settings_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
    base.join("linguatray").join("settings.toml")
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read settings {}", path.display()))?;
        let cfg: Settings = toml::from_str(&s).context("parse settings")?;
        Ok(cfg)
    }

    /// Missing or unreadable settings are not an error at startup.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log_load_miss(path, &e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create settings dir {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).context("serialize settings")?;
        std::fs::write(path, s).with_context(|| format!("write settings {}", path.display()))?;
        Ok(())
    }
}

fn log_load_miss(path: &Path, e: &anyhow::Error) {
    // First run has no file; anything else is worth a visible hint.
    if path.exists() {
        eprintln!("settings unreadable, using defaults ({e:#})");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let cfg = Settings::load_or_default(&path);
        assert_eq!(cfg, Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[window]\nwidth = 640\n").unwrap();

        let cfg = Settings::load(&path).unwrap();
        assert_eq!(cfg.window.width, 640);
        assert_eq!(cfg.window.height, default_height());
        assert_eq!(cfg.translate, TranslateSettings::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut cfg = Settings::default();
        cfg.window.width = 800;
        cfg.translate.model = "qwen2.5:7b".to_string();
        cfg.translate.target_lang = "de".to_string();
        cfg.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }
}
