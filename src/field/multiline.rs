use serde_json::Value;

use super::{Field, FieldError, Messages, Validator, text_option, validate};

/// A plain multi-line text field without an editor panel or auto-sizing.
///
/// Registered in place of the code editor where the editor engine cannot run.
pub struct MultilineInputField {
    value: String,
    validator: Option<Validator>,
    max_lines: Option<usize>,
}

impl MultilineInputField {
    pub const TYPE_NAME: &'static str = "field_multilinetext";

    pub fn new(value: Option<String>, validator: Option<Validator>) -> Self {
        Self {
            value: value.unwrap_or_default(),
            validator,
            max_lines: None,
        }
    }

    /// Limits the value to its first `max_lines` lines.
    pub fn max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = Some(max_lines);
        self.value = truncate_lines(&self.value, max_lines);
        self
    }

    /// Creates a field from its JSON definition, honouring `text` and
    /// `maxLines`.
    pub fn from_json(options: &Value, messages: &Messages) -> Result<Self, FieldError> {
        let text = text_option(options, messages)?;
        let field = Self::new(Some(text), None);

        match options.get("maxLines") {
            None | Some(Value::Null) => Ok(field),
            Some(value) => match value.as_u64() {
                Some(max_lines) if max_lines > 0 => Ok(field.max_lines(max_lines as usize)),
                _ => Err(FieldError::InvalidOption { name: "maxLines" }),
            },
        }
    }
}

fn truncate_lines(text: &str, max_lines: usize) -> String {
    text.split('\n').take(max_lines).collect::<Vec<_>>().join("\n")
}

impl Field for MultilineInputField {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn value(&self) -> String {
        self.value.clone()
    }

    fn set_value(&mut self, value: &str) -> bool {
        let Some(mut accepted) = validate(self.validator.as_ref(), value) else {
            return false;
        };
        if let Some(max_lines) = self.max_lines {
            accepted = truncate_lines(&accepted, max_lines);
        }
        if accepted == self.value {
            return false;
        }
        self.value = accepted;
        true
    }

    fn is_serializable(&self) -> bool {
        true
    }
}
