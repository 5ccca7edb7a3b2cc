use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::ui::settings::UiSettings;

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("story_panels");
    path.push("ui_settings.json");
    path
}

pub fn load_settings() -> UiSettings {
    load_from(&settings_path())
}

pub fn save_settings(settings: &UiSettings) {
    if let Err(e) = save_to(&settings_path(), settings) {
        warn!(error = %format!("{e:#}"), "could not save UI settings");
    }
}

/// Unreadable or missing files give the defaults.
pub fn load_from(path: &Path) -> UiSettings {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn save_to(path: &Path, settings: &UiSettings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ui_settings.json");

        let settings = UiSettings {
            ui_scale: 1.25,
            ..Default::default()
        };
        save_to(&path, &settings).unwrap();

        assert_eq!(load_from(&path), settings);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ui_settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_from(&path), UiSettings::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_from(&dir.path().join("absent.json")), UiSettings::default());
    }
}
