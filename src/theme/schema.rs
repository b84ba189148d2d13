use std::sync::LazyLock;

use gpui::{Font, Global, Pixels, Rgba, SharedString, font};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::deserializers::{de_pixels, de_string_or_non_empty_list};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditorTheme {
    pub name: SharedString,
    pub dark: bool,
    pub colors: EditorColors,
    pub font: EditorFont,
}

static ONE_DARK: LazyLock<EditorTheme> = LazyLock::new(|| {
    EditorTheme::from_string(include_str!("../../themes/one_dark.json")).unwrap()
});

impl AsRef<EditorTheme> for EditorTheme {
    fn as_ref(&self) -> &EditorTheme {
        self
    }
}

impl EditorTheme {
    /// Name of the theme fields use when their options name none.
    pub const DEFAULT_NAME: &'static str = "one_dark";

    pub fn one_dark() -> &'static EditorTheme {
        &ONE_DARK
    }

    /// Looks up a bundled theme by the name used in field options.
    pub fn builtin(name: &str) -> Option<&'static EditorTheme> {
        match name {
            Self::DEFAULT_NAME => Some(&ONE_DARK),
            _ => None,
        }
    }

    pub fn from_string<S: AsRef<str>>(str: S) -> Result<EditorTheme, serde_json::Error> {
        serde_json::from_str(str.as_ref())
    }
}

impl Global for EditorTheme {}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditorColors {
    pub background: Rgba,
    pub foreground: Rgba,
    pub gutter_background: Rgba,
    pub gutter_foreground: Rgba,
    pub border: Rgba,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EditorFont {
    /// Families in fallback order. The first one is used for measuring.
    #[serde(deserialize_with = "de_string_or_non_empty_list")]
    pub family: SmallVec<[SharedString; 1]>,
    #[serde(deserialize_with = "de_pixels")]
    pub size: Pixels,
    #[serde(deserialize_with = "de_pixels")]
    pub line_height: Pixels,
}

impl EditorFont {
    pub fn font(&self) -> Font {
        font(self.family[0].clone())
    }
}

#[cfg(test)]
mod tests {
    use gpui::px;

    use super::*;

    #[test]
    fn test_one_dark_loads() {
        let theme = EditorTheme::one_dark();
        assert_eq!(&*theme.name, "One Dark");
        assert!(theme.dark);
        assert_eq!(theme.font.size, px(14.));
        assert_eq!(theme.font.line_height, px(20.));
        assert_eq!(&*theme.font.family[0], "Zed Mono");
        assert!(theme.colors.foreground.a > 0.);
    }

    #[test]
    fn test_builtin_lookup() {
        let theme = EditorTheme::builtin(EditorTheme::DEFAULT_NAME).unwrap();
        assert_eq!(&*theme.name, "One Dark");
        assert!(EditorTheme::builtin("solarized").is_none());
    }

    #[test]
    fn test_single_family_string() {
        let theme = EditorTheme::from_string(
            r##"{
                "name": "Plain",
                "dark": false,
                "colors": {
                    "background": "#ffffff",
                    "foreground": "#000000",
                    "gutter_background": "#eeeeee",
                    "gutter_foreground": "#999999",
                    "border": "#cccccc"
                },
                "font": { "family": "Menlo", "size": 12, "line_height": "18px" }
            }"##,
        )
        .unwrap();

        assert_eq!(theme.font.family.len(), 1);
        assert_eq!(theme.font.line_height, px(18.));
    }
}
