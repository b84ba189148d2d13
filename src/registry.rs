//! Field type registration and browser capability detection.

use std::sync::LazyLock;

use fancy_regex::Regex;
use indexmap::IndexMap;
use serde_json::Value;

use crate::field::{CodeEditorField, Field, FieldError, Messages, MultilineInputField};

static SAFARI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^((?!chrome|android).)*safari").unwrap());

/// Concrete field implementation a registered type name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    CodeEditor,
    MultilineInput,
}

impl FieldKind {
    /// Builds a field of this kind from its JSON definition.
    pub fn from_json(self, options: &Value, messages: &Messages) -> Result<Box<dyn Field>, FieldError> {
        Ok(match self {
            Self::CodeEditor => Box::new(CodeEditorField::from_json(options, messages)?),
            Self::MultilineInput => Box::new(MultilineInputField::from_json(options, messages)?),
        })
    }
}

/// Maps field type names used in block definitions to implementations.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    kinds: IndexMap<String, FieldKind>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_name: impl Into<String>, kind: FieldKind) -> Result<(), FieldError> {
        let type_name = type_name.into();
        if self.kinds.contains_key(&type_name) {
            return Err(FieldError::AlreadyRegistered(type_name));
        }
        tracing::trace!(%type_name, ?kind, "registered field type");
        self.kinds.insert(type_name, kind);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<FieldKind> {
        self.kinds.get(type_name).copied()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Creates the field registered under `type_name`.
    pub fn create_from_json(
        &self,
        type_name: &str,
        options: &Value,
        messages: &Messages,
    ) -> Result<Box<dyn Field>, FieldError> {
        let kind = self
            .get(type_name)
            .ok_or_else(|| FieldError::Unregistered(type_name.to_owned()))?;
        kind.from_json(options, messages)
    }
}

/// What the embedding browser can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrowserCapabilities {
    /// Safari cannot host the editor engine.
    pub safari: bool,
}

impl BrowserCapabilities {
    pub fn from_user_agent(user_agent: &str) -> Self {
        Self {
            safari: SAFARI.is_match(user_agent).unwrap_or(false),
        }
    }
}

/// Registers the code editor field type, falling back to a plain multi-line
/// text field on Safari. Returns the kind that was registered.
pub fn register_code_editor(
    registry: &mut FieldRegistry,
    capabilities: &BrowserCapabilities,
) -> Result<FieldKind, FieldError> {
    let kind = if capabilities.safari {
        FieldKind::MultilineInput
    } else {
        FieldKind::CodeEditor
    };
    registry.register(CodeEditorField::TYPE_NAME, kind)?;
    tracing::debug!(?kind, "code editor field registered");
    Ok(kind)
}
