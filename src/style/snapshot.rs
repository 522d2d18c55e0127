use crate::score::document::Document;
use crate::style::model::{FontHandle, StyleId, default_style};

/// Style values captured once at the start of a layout pass.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StyleSnapshot {
    /// Staff space at pass start.
    pub spatium: f64,
    /// Whether the first system is indented.
    pub first_system_indent: bool,
    /// First system indentation, in spatium units.
    pub first_system_indent_sp: f64,
    /// Engraving font at pass start; absent without a document.
    #[serde(skip)]
    pub font: Option<FontHandle>,
}

impl StyleSnapshot {
    /// Capture from `doc`, or from the default style when there is no document.
    pub fn capture(doc: Option<&dyn Document>) -> Self {
        let style = match doc {
            Some(d) => d.style(),
            None => default_style(),
        };
        let first_system_indent = match doc {
            Some(d) => d.style_bool(StyleId::EnableIndentationOnFirstSystem),
            None => style
                .value_bool(StyleId::EnableIndentationOnFirstSystem)
                .unwrap_or(false),
        };
        Self {
            spatium: doc.map_or_else(|| style.spatium(), |d| d.spatium()),
            first_system_indent,
            first_system_indent_sp: style
                .value_f64(StyleId::FirstSystemIndentationValue)
                .unwrap_or(0.0),
            font: doc.and_then(|d| d.engraving_font()),
        }
    }

    /// First system indentation in engine units, zero when indentation is off.
    pub fn first_system_indent_width(&self) -> f64 {
        if self.first_system_indent {
            self.first_system_indent_sp * self.spatium
        } else {
            0.0
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/snapshot.rs"]
mod tests;
