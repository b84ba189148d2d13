use gpui::App;

use crate::theme::EditorTheme;

/// Extension trait for accessing and modifying the global editor theme.
pub trait ThemeExt {
    /// Changes the theme.
    fn set_theme<T: AsRef<EditorTheme>>(&mut self, theme: T);

    /// Gets an immutable reference to the theme.
    fn get_theme(&self) -> &EditorTheme;

    /// The bundled theme called `name`, or the global theme when none is.
    fn resolve_theme(&self, name: &str) -> &EditorTheme;
}

impl ThemeExt for App {
    fn set_theme<T: AsRef<EditorTheme>>(&mut self, theme: T) {
        self.set_global::<EditorTheme>(theme.as_ref().clone())
    }

    fn get_theme(&self) -> &EditorTheme {
        self.global()
    }

    fn resolve_theme(&self, name: &str) -> &EditorTheme {
        EditorTheme::builtin(name).unwrap_or_else(|| self.get_theme())
    }
}
