use gpui::App;

use crate::theme::{EditorTheme, ThemeExt};

/// Installs the default editor theme and the code editor key bindings. Call
/// once before rendering a [`crate::components::CodeEditor`].
pub fn init(cx: &mut App) {
    cx.set_theme(EditorTheme::one_dark());
    crate::components::bind_keys(cx);
}

#[cfg(all(test, feature = "test-support"))]
mod tests {
    use super::*;
    use gpui::TestAppContext;

    #[gpui::test]
    fn test_init_installs_theme(cx: &mut TestAppContext) {
        cx.update(|cx| {
            init(cx);
            assert_eq!(&*cx.get_theme().name, "One Dark");
        });
    }
}
