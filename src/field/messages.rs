use std::sync::LazyLock;

use fancy_regex::Regex;
use indexmap::IndexMap;

static MESSAGE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\{(?i:bky_)([A-Za-z0-9_]+)\}").unwrap());

/// Localised message table used to expand `%{BKY_NAME}` references.
///
/// Names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Messages {
    entries: IndexMap<String, String>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, message: impl Into<String>) {
        self.entries.insert(name.as_ref().to_uppercase(), message.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_uppercase()).map(String::as_str)
    }

    /// Replaces every `%{BKY_NAME}` reference in `text` with its message.
    /// References to unknown messages are kept verbatim.
    pub fn replace_references(&self, text: &str) -> String {
        let mut replaced = String::with_capacity(text.len());
        let mut last = 0;

        for captures in MESSAGE_REFERENCE.captures_iter(text) {
            let Ok(captures) = captures else {
                break;
            };
            let (Some(reference), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };

            replaced.push_str(&text[last..reference.start()]);
            match self.get(name.as_str()) {
                Some(message) => replaced.push_str(message),
                None => replaced.push_str(reference.as_str()),
            }
            last = reference.end();
        }

        replaced.push_str(&text[last..]);
        replaced
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Messages {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut messages = Self::new();
        for (name, message) in iter {
            messages.insert(name, message);
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_known_reference() {
        let messages: Messages = [("GREETING", "hello")].into_iter().collect();
        assert_eq!(
            messages.replace_references("// %{BKY_GREETING} world"),
            "// hello world"
        );
    }

    #[test]
    fn test_reference_names_ignore_case() {
        let messages: Messages = [("greeting", "hi")].into_iter().collect();
        assert_eq!(messages.replace_references("%{bky_Greeting}!"), "hi!");
    }

    #[test]
    fn test_unknown_reference_kept() {
        let messages = Messages::new();
        assert_eq!(
            messages.replace_references("a %{BKY_MISSING} b"),
            "a %{BKY_MISSING} b"
        );
    }

    #[test]
    fn test_multiple_references() {
        let messages: Messages = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(
            messages.replace_references("%{BKY_A}+%{BKY_B}=%{BKY_C}"),
            "1+2=%{BKY_C}"
        );
    }

    #[test]
    fn test_text_without_references() {
        let messages = Messages::new();
        assert_eq!(messages.replace_references("let x = {};"), "let x = {};");
    }
}
