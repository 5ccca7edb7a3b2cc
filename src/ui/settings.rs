use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UiSettings {
    pub ui_scale: f32,

    /// Widest an image is drawn, in points.
    pub preview_width: f32,

    // Status kind → color mapping
    pub status_colors: HashMap<String, [u8; 4]>,
}

impl Default for UiSettings {
    fn default() -> Self {
        let mut status_colors = HashMap::new();

        status_colors.insert("Info".into(), [90, 140, 200, 255]);
        status_colors.insert("Warning".into(), [220, 170, 40, 255]);
        status_colors.insert("Error".into(), [210, 70, 70, 255]);

        Self {
            ui_scale: 1.0,
            preview_width: 512.0,
            status_colors,
        }
    }
}

impl UiSettings {
    pub fn color(&self, key: &str) -> Color32 {
        self.status_colors
            .get(key)
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .unwrap_or(Color32::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: UiSettings = serde_json::from_str(r#"{"ui_scale": 1.5}"#).unwrap();

        assert_eq!(settings.ui_scale, 1.5);
        assert_eq!(settings.preview_width, 512.0);
        assert_eq!(settings.color("Error"), Color32::from_rgb(210, 70, 70));
    }

    #[test]
    fn unknown_status_is_white() {
        assert_eq!(UiSettings::default().color("Shrug"), Color32::WHITE);
    }
}
