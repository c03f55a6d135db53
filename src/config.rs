// Tunable settings, read once per run from `settings.json` and passed into
// the pipeline as a plain immutable value. Every option falls back to its
// built-in default independently; a missing or malformed file downgrades the
// whole set to defaults with a diagnostic and the run continues.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Force a fixed brightness onto all non-near-black commands.
    pub set_uniform_brightness: bool,
    /// Brightness target on the device's 0-1000 scale.
    pub uniform_brightness: u32,
    /// Apply a global saturation multiplier to every zone color.
    pub set_color_boost: bool,
    /// Saturation multiplier used when color boost is on (>= 1.0).
    pub color_boost_factor: f64,
    /// Per-channel change threshold for the change detector.
    pub component_threshold: i32,
    /// Aggregate (summed) change threshold for the change detector.
    pub manhattan_threshold: f64,
    /// Blackness sensitivity for letterbox detection.
    pub threshold_value: u32,
    /// Whether the letterbox preprocessor runs at all.
    pub enable_letterbox_detection: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            set_uniform_brightness: false,
            uniform_brightness: 500,
            set_color_boost: false,
            color_boost_factor: 1.0,
            component_threshold: 250,
            manhattan_threshold: 150.0,
            threshold_value: 10,
            enable_letterbox_detection: true,
        }
    }
}

impl Settings {
    pub fn load_or_default(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("settings {} unavailable ({err}); using defaults", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("settings {} are malformed ({err}); using defaults", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_options_keep_their_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"set_color_boost": true, "manhattan_threshold": 42.5}"#)
                .unwrap();
        assert!(settings.set_color_boost);
        assert_eq!(settings.manhattan_threshold, 42.5);
        assert_eq!(settings.uniform_brightness, 500);
        assert_eq!(settings.component_threshold, 250);
        assert!(settings.enable_letterbox_detection);
    }

    #[test]
    fn unrecognized_options_are_ignored() {
        let settings: Settings =
            serde_json::from_str(r#"{"selected_monitor_index": 2, "threshold_value": 7}"#).unwrap();
        assert_eq!(settings.threshold_value, 7);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::load_or_default(Path::new("/nonexistent/settings.json"));
        assert_eq!(settings.manhattan_threshold, 150.0);
        assert!(!settings.set_uniform_brightness);
    }
}
