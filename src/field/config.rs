use serde::{Deserialize, Serialize};

use crate::panel::SizingConfig;

/// Options a code editor field is created with, usually the JSON block
/// definition of the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub sizing: SizingConfig,
    /// Language mode, `javascript` when unset.
    pub language: Option<String>,
    /// Editor theme name, `one_dark` when unset.
    pub theme: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_ignores_unknown_options() {
        let config: FieldConfig = serde_json::from_value(serde_json::json!({
            "type": "field_code_editor",
            "name": "CODE",
            "text": "x = 1",
            "language": "python",
            "tooltip": "Edit the code",
        }))
        .unwrap();

        assert_eq!(config.language.as_deref(), Some("python"));
        assert_eq!(config.sizing, SizingConfig::default());
    }

    #[test]
    fn test_config_nested_sizing() {
        let config: FieldConfig = serde_json::from_value(serde_json::json!({
            "sizing": { "initial_height": 120 },
        }))
        .unwrap();

        assert_eq!(config.sizing.initial_height, 120.);
        assert_eq!(config.sizing.initial_width, 500.);
    }
}
