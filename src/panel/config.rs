use serde::{Deserialize, Serialize};

/// Constants governing how a code panel grows and when it starts wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Width the panel starts at and never shrinks below.
    pub initial_width: f32,
    /// Height the panel starts at and never shrinks below.
    pub initial_height: f32,
    /// Space reserved for the line-number gutter.
    pub gutter_width: f32,
    /// Share of the free workspace width the panel may grow into before it
    /// switches to wrapping.
    pub wrap_multiplier: f32,
}

impl SizingConfig {
    pub const INITIAL_WIDTH: f32 = 500.;
    pub const INITIAL_HEIGHT: f32 = 200.;
    pub const GUTTER_WIDTH: f32 = 30.;
    pub const WRAP_MULTIPLIER: f32 = 0.7;
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            initial_width: Self::INITIAL_WIDTH,
            initial_height: Self::INITIAL_HEIGHT,
            gutter_width: Self::GUTTER_WIDTH,
            wrap_multiplier: Self::WRAP_MULTIPLIER,
        }
    }
}

/// Current size and wrap mode of a panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGeometry {
    pub width: f32,
    pub height: f32,
    pub wrap_enabled: bool,
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelSize {
    pub width: f32,
    pub height: f32,
}

/// Style of the element the editor is embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelContainer {
    pub width: f32,
    pub height: f32,
    pub min_width: f32,
    pub min_height: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing_defaults() {
        let config = SizingConfig::default();
        assert_eq!(config.initial_width, 500.);
        assert_eq!(config.initial_height, 200.);
        assert_eq!(config.gutter_width, 30.);
        assert_eq!(config.wrap_multiplier, 0.7);
    }

    #[test]
    fn test_sizing_partial_override() {
        let config: SizingConfig =
            serde_json::from_str(r#"{ "initial_width": 320, "wrap_multiplier": 0.5 }"#).unwrap();
        assert_eq!(config.initial_width, 320.);
        assert_eq!(config.initial_height, 200.);
        assert_eq!(config.wrap_multiplier, 0.5);
    }
}
