//! Player input preferences
//!
//! Kept in SessionStorage so they last for the page session only.

use serde::{Deserialize, Serialize};

/// Input preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `KeyboardEvent.key` value that cuts the block
    pub split_key: String,
    /// `KeyboardEvent.key` value that toggles autopilot
    pub autopilot_key: String,
    /// Last autopilot choice; reloading the page keeps it on
    pub autopilot: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            split_key: " ".to_string(),
            autopilot_key: "a".to_string(),
            autopilot: false,
        }
    }
}

impl Settings {
    /// Does this key press request a split?
    pub fn is_split_key(&self, key: &str) -> bool {
        key == self.split_key
    }

    /// Does this key press toggle autopilot? (case-insensitive)
    pub fn is_autopilot_key(&self, key: &str) -> bool {
        key.eq_ignore_ascii_case(&self.autopilot_key)
    }

    /// Remember the autopilot choice; returns true if it changed
    pub fn set_autopilot(&mut self, enabled: bool) -> bool {
        let changed = self.autopilot != enabled;
        self.autopilot = enabled;
        changed
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// SessionStorage key
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    const STORAGE_KEY: &'static str = "stack_tower_settings";

    /// Load settings from SessionStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.session_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from SessionStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to SessionStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.session_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    if storage.set_item(Self::STORAGE_KEY, &json).is_ok() {
                        log::info!("Settings saved");
                    }
                }
                Err(e) => log::warn!("Could not encode settings: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys() {
        let settings = Settings::default();
        assert!(settings.is_split_key(" "));
        assert!(!settings.is_split_key("Enter"));
        assert!(settings.is_autopilot_key("A"));
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let settings: Settings = serde_json::from_str(r#"{ "split_key": "Enter" }"#).unwrap();
        assert!(settings.is_split_key("Enter"));
        assert_eq!(settings.autopilot_key, "a");
        assert!(!settings.autopilot);
    }

    #[test]
    fn test_saved_json_loads_back() {
        let mut settings = Settings {
            split_key: "Enter".to_string(),
            ..Settings::default()
        };
        assert!(settings.set_autopilot(true));
        assert!(!settings.set_autopilot(true));

        let json = settings.to_json().unwrap();
        let loaded = Settings::from_json(&json).unwrap();
        assert_eq!(loaded, settings);
        assert!(loaded.autopilot);
        assert!(loaded.is_split_key("Enter"));
    }
}
