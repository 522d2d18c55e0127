//! JSON style overrides.
//!
//! A style file is a flat object of camelCase style keys. Keys that are absent
//! keep their default value:
//!
//! ```json
//! { "spatium": 20.0, "enableIndentationOnFirstSystem": false }
//! ```

use std::collections::BTreeMap;

use anyhow::Context;

use crate::foundation::error::{LayoutError, LayoutResult};
use crate::style::model::{Style, StyleId, StyleValue};

/// Parsed but not yet applied style overrides.
pub type StyleOverrides = BTreeMap<StyleId, StyleValue>;

impl Style {
    /// Build a style from JSON overrides applied on top of the default style.
    pub fn from_json_str(s: &str) -> LayoutResult<Self> {
        let overrides: StyleOverrides =
            serde_json::from_str(s).map_err(|e| LayoutError::serde(e.to_string()))?;
        let mut style = Style::default();
        style.apply(overrides)?;
        Ok(style)
    }

    /// Load a style file from disk; see [`Style::from_json_str`].
    pub fn from_json_path(path: impl AsRef<std::path::Path>) -> LayoutResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read style file {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Apply every override, stopping at the first invalid one.
    pub fn apply(&mut self, overrides: StyleOverrides) -> LayoutResult<()> {
        for (id, value) in overrides {
            self.set(id, value)?;
        }
        Ok(())
    }

    /// Serialize the values that differ from the default style.
    pub fn to_json_string(&self) -> LayoutResult<String> {
        let overrides: StyleOverrides = self.overrides().map(|(id, v)| (id, v.clone())).collect();
        serde_json::to_string(&overrides).map_err(|e| LayoutError::serde(e.to_string()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/config.rs"]
mod tests;
