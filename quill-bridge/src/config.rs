//! Editor configuration.
//!
//! [`EditorOptions`] is the plain-data half and can be loaded from JSON.
//! [`EditorConfig`] adds the host callbacks and is what
//! [`RichEditor`](crate::controller::RichEditor) is built from.

use quill_core::height::DEFAULT_INITIAL_HEIGHT;
use quill_core::protocol::{DEFAULT_NAMESPACE, is_valid_namespace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ChangeCallback = Box<dyn FnMut(&str) + Send>;
pub type LoadEndCallback = Box<dyn FnMut() + Send>;
pub type HeightCallback = Box<dyn FnMut(u32) + Send>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editor options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`{0}` is not a dotted identifier path")]
    InvalidNamespace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorOptions {
    /// Initial (and controlled) content of the editable root.
    pub value: Option<String>,
    pub placeholder: Option<String>,
    /// Extra CSS injected once the document has loaded.
    pub injected_css: Option<String>,
    pub bg_color: Option<String>,
    /// CSS baked into the initial document.
    pub custom_styles: Option<String>,
    pub max_height: Option<u32>,
    pub initial_height: u32,
    /// Object the embedded runtime is published under.
    pub namespace: String,
    /// Apply only the last height report of each drained batch.
    pub coalesce_height_events: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            value: None,
            placeholder: None,
            injected_css: None,
            bg_color: None,
            custom_styles: None,
            max_height: None,
            initial_height: DEFAULT_INITIAL_HEIGHT,
            namespace: DEFAULT_NAMESPACE.to_string(),
            coalesce_height_events: false,
        }
    }
}

impl EditorOptions {
    /// Parse host-supplied JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_namespace(&self.namespace) {
            return Err(ConfigError::InvalidNamespace(self.namespace.clone()));
        }
        Ok(())
    }
}

/// Options plus callbacks, assembled with a consuming builder.
#[derive(Default)]
pub struct EditorConfig {
    pub options: EditorOptions,
    pub(crate) on_change: Option<ChangeCallback>,
    pub(crate) on_load_end: Option<LoadEndCallback>,
    pub(crate) on_height_change: Option<HeightCallback>,
}

impl std::fmt::Debug for EditorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorConfig")
            .field("options", &self.options)
            .field("on_change", &self.on_change.is_some())
            .field("on_load_end", &self.on_load_end.is_some())
            .field("on_height_change", &self.on_height_change.is_some())
            .finish()
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: EditorOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.options.value = Some(value.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.options.placeholder = Some(placeholder.into());
        self
    }

    pub fn injected_css(mut self, css: impl Into<String>) -> Self {
        self.options.injected_css = Some(css.into());
        self
    }

    pub fn bg_color(mut self, color: impl Into<String>) -> Self {
        self.options.bg_color = Some(color.into());
        self
    }

    pub fn custom_styles(mut self, css: impl Into<String>) -> Self {
        self.options.custom_styles = Some(css.into());
        self
    }

    pub fn max_height(mut self, max: u32) -> Self {
        self.options.max_height = Some(max);
        self
    }

    pub fn initial_height(mut self, height: u32) -> Self {
        self.options.initial_height = height;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.options.namespace = namespace.into();
        self
    }

    pub fn coalesce_height_events(mut self, enabled: bool) -> Self {
        self.options.coalesce_height_events = enabled;
        self
    }

    /// Called with the new markup whenever the document reports content
    /// that differs from the last value the host supplied.
    pub fn on_change(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Called once, after the first load completes.
    pub fn on_load_end(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_load_end = Some(Box::new(callback));
        self
    }

    /// Called with the new layout height whenever it changes.
    pub fn on_height_change(mut self, callback: impl FnMut(u32) + Send + 'static) -> Self {
        self.on_height_change = Some(Box::new(callback));
        self
    }
}
