use gpui::{ElementId, SharedString};

pub trait ElementIdExt {
    /// Derives the id of a child element, e.g. a code panel's gutter.
    fn with_suffix(&self, suffix: impl Into<SharedString>) -> ElementId;
}

impl ElementIdExt for ElementId {
    fn with_suffix(&self, suffix: impl Into<SharedString>) -> ElementId {
        ElementId::NamedChild(Box::new(self.clone()), suffix.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes_are_distinct() {
        let id = ElementId::from("code-editor");
        assert_ne!(id.with_suffix("gutter"), id.with_suffix("content"));
        assert_eq!(id.with_suffix("gutter"), id.with_suffix("gutter"));
    }
}
