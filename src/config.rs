//! Core configuration.
//!
//! Loading is left to the embedding application; this struct only describes
//! the knobs and their defaults so it can be deserialized from whatever
//! settings file the host uses.

use serde::Deserialize;

use crate::pane::PaneSize;

/// Configuration for the switchboard core.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// Show the idle glyph for sessions that finished thinking while unfocused.
    pub idle_indicator: bool,
    /// Geometry used when a spawn request carries no explicit size.
    pub default_size: PaneSize,
    /// Name given to the first tab of a session.
    pub primary_tab_name: String,
    /// Name given to tabs added after the primary one.
    pub secondary_tab_name: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            idle_indicator: true,
            default_size: PaneSize::default(),
            primary_tab_name: "Main".to_string(),
            secondary_tab_name: "Shell".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert!(config.idle_indicator);
        assert_eq!(config.default_size, PaneSize::new(24, 80));
        assert_eq!(config.primary_tab_name, "Main");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: CoreConfig =
            serde_json::from_str(r#"{ "idleIndicator": false, "defaultSize": { "rows": 40, "cols": 120 } }"#)
                .unwrap();

        assert!(!config.idle_indicator);
        assert_eq!(config.default_size, PaneSize::new(40, 120));
        assert_eq!(config.secondary_tab_name, "Shell");
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: CoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
    }
}
