//! Block fields: the code editor field and its plain-text fallback.

mod config;
pub use config::*;

mod messages;
pub use messages::*;

mod multiline;
pub use multiline::*;

use std::rc::Rc;

use gpui_code_primitives::{EditorEngine, EditorSetup, LayoutUpdate};
use serde_json::Value;

use crate::host::{FieldHost, WorkspaceKind, WorkspaceMetrics};
use crate::panel::PanelController;

/// Document shown in a new editor whose value is empty.
pub const PLACEHOLDER_DOCUMENT: &str = "// Insert code here\n\n\n";

#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("field options must be a JSON object")]
    NotAnObject,
    #[error("field option `{name}` has the wrong type")]
    InvalidOption { name: &'static str },
    #[error("invalid field config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("no field type is registered under `{0}`")]
    Unregistered(String),
    #[error("a field type is already registered under `{0}`")]
    AlreadyRegistered(String),
}

/// Capabilities a field offers to the block that owns it.
pub trait Field {
    /// Key the field type is registered under.
    fn type_name(&self) -> &'static str;

    fn value(&self) -> String;

    /// Validates and stores a new value. Returns whether the value changed.
    fn set_value(&mut self, value: &str) -> bool;

    /// Whether the value is saved with the block.
    fn is_serializable(&self) -> bool;
}

/// Checks a proposed value. Returns the value to store, which may differ from
/// the input, or `None` to reject the change.
pub type Validator = Rc<dyn Fn(&str) -> Option<String>>;

pub(crate) fn validate(validator: Option<&Validator>, value: &str) -> Option<String> {
    match validator {
        Some(validator) => validator(value),
        None => Some(value.to_owned()),
    }
}

/// Reads the `text` option of a JSON field definition, expanding message
/// references. A missing or null `text` is empty.
pub(crate) fn text_option(options: &Value, messages: &Messages) -> Result<String, FieldError> {
    let options = options.as_object().ok_or(FieldError::NotAnObject)?;
    match options.get("text") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(messages.replace_references(text)),
        Some(_) => Err(FieldError::InvalidOption { name: "text" }),
    }
}

/// The live editor behind a field whose view has been created.
#[derive(Clone)]
struct FieldView {
    engine: Rc<dyn EditorEngine>,
    controller: Rc<PanelController>,
}

/// A block field holding source code, edited in an auto-sizing editor panel.
pub struct CodeEditorField {
    value: String,
    validator: Option<Validator>,
    config: FieldConfig,
    view: Option<FieldView>,
}

impl CodeEditorField {
    pub const TYPE_NAME: &'static str = "field_code_editor";
    pub const SERIALIZABLE: bool = true;

    pub fn new(value: Option<String>, validator: Option<Validator>, config: FieldConfig) -> Self {
        Self {
            value: value.unwrap_or_default(),
            validator,
            config,
            view: None,
        }
    }

    /// Creates a field from its JSON definition.
    pub fn from_json(options: &Value, messages: &Messages) -> Result<Self, FieldError> {
        let text = text_option(options, messages)?;
        let config = serde_json::from_value(options.clone())?;
        Ok(Self::new(Some(text), None, config))
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }

    pub fn controller(&self) -> Option<&Rc<PanelController>> {
        self.view.as_ref().map(|view| &view.controller)
    }

    /// Extensions the editor is created with for a field in `workspace`.
    pub fn editor_setup(&self, workspace: WorkspaceKind) -> EditorSetup {
        let defaults = EditorSetup::default();
        EditorSetup {
            language: self.config.language.clone().unwrap_or(defaults.language),
            theme: self.config.theme.clone().unwrap_or(defaults.theme),
            editable: workspace.is_editable(),
            tooltips_in_overlay: true,
            line_wrapping: false,
        }
    }

    /// Text the editor starts with.
    pub fn initial_document(&self) -> &str {
        if self.value.is_empty() {
            PLACEHOLDER_DOCUMENT
        } else {
            &self.value
        }
    }

    /// Creates the editor and the panel controller that sizes it, and routes
    /// the editor's layout notifications to the controller.
    pub fn init_view<E>(
        &mut self,
        workspace: WorkspaceKind,
        create_engine: impl FnOnce(&str, EditorSetup) -> E,
        metrics: Rc<dyn WorkspaceMetrics>,
        host: Rc<dyn FieldHost>,
    ) -> (Rc<E>, Rc<PanelController>)
    where
        E: EditorEngine + 'static,
    {
        if self.view.is_some() {
            tracing::debug!("recreating code editor view");
        }

        let engine = Rc::new(create_engine(
            self.initial_document(),
            self.editor_setup(workspace),
        ));
        let controller = Rc::new(PanelController::new(
            engine.clone(),
            metrics,
            host,
            self.config.sizing,
        ));

        let target = Rc::downgrade(&controller);
        engine.subscribe(Rc::new(move |update: &LayoutUpdate| {
            if let Some(controller) = target.upgrade() {
                controller.on_layout_changed(update);
            }
        }));

        self.view = Some(FieldView {
            engine: engine.clone(),
            controller: controller.clone(),
        });
        (engine, controller)
    }
}

impl Field for CodeEditorField {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn value(&self) -> String {
        match &self.view {
            Some(view) => view.engine.text(),
            None => self.value.clone(),
        }
    }

    fn set_value(&mut self, value: &str) -> bool {
        let Some(accepted) = validate(self.validator.as_ref(), value) else {
            tracing::trace!("validator rejected new code editor value");
            return false;
        };
        if accepted == self.value() {
            return false;
        }

        if let Some(view) = &self.view {
            if let Err(err) = view.engine.replace_text(&accepted) {
                tracing::warn!(%err, "could not push value to the code editor");
                return false;
            }
        }
        self.value = accepted;
        true
    }

    fn is_serializable(&self) -> bool {
        Self::SERIALIZABLE
    }
}
