use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use crate::foundation::error::{LayoutError, LayoutResult};

/// Spatium of the default style, in engine units (1.75mm at 360 DPI).
pub const DEFAULT_SPATIUM: f64 = 24.8;

/// Style keys understood by the layout engine.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum StyleId {
    /// Staff space, the base unit every other distance scales with.
    Spatium,
    /// Whether the first system of the score is indented.
    EnableIndentationOnFirstSystem,
    /// First system indentation, in spatium units.
    FirstSystemIndentationValue,
    /// Minimum distance between systems, in spatium units.
    MinSystemDistance,
    /// Maximum distance between systems, in spatium units.
    MaxSystemDistance,
    /// Distance between staves of one system, in spatium units.
    StaffDistance,
    /// Page width in inches.
    PageWidth,
    /// Page height in inches.
    PageHeight,
    /// Family name of the engraving (SMuFL) font.
    MusicalSymbolFont,
}

impl StyleId {
    /// Every key, in declaration order.
    pub const ALL: [StyleId; 9] = [
        StyleId::Spatium,
        StyleId::EnableIndentationOnFirstSystem,
        StyleId::FirstSystemIndentationValue,
        StyleId::MinSystemDistance,
        StyleId::MaxSystemDistance,
        StyleId::StaffDistance,
        StyleId::PageWidth,
        StyleId::PageHeight,
        StyleId::MusicalSymbolFont,
    ];

    fn default_value(self) -> StyleValue {
        match self {
            StyleId::Spatium => StyleValue::Real(DEFAULT_SPATIUM),
            StyleId::EnableIndentationOnFirstSystem => StyleValue::Bool(true),
            StyleId::FirstSystemIndentationValue => StyleValue::Real(5.0),
            StyleId::MinSystemDistance => StyleValue::Real(8.5),
            StyleId::MaxSystemDistance => StyleValue::Real(15.0),
            StyleId::StaffDistance => StyleValue::Real(6.5),
            StyleId::PageWidth => StyleValue::Real(8.27),
            StyleId::PageHeight => StyleValue::Real(11.69),
            StyleId::MusicalSymbolFont => StyleValue::Str("Leland".to_string()),
        }
    }
}

/// A single style value.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    /// Boolean flag.
    Bool(bool),
    /// Real-valued scalar.
    Real(f64),
    /// String value (font names).
    Str(String),
}

impl StyleValue {
    fn same_kind(&self, other: &StyleValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    fn kind_name(&self) -> &'static str {
        match self {
            StyleValue::Bool(_) => "bool",
            StyleValue::Real(_) => "real",
            StyleValue::Str(_) => "string",
        }
    }
}

/// Complete style table: every [`StyleId`] always has a value.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    values: BTreeMap<StyleId, StyleValue>,
}

static DEFAULT_STYLE: LazyLock<Style> = LazyLock::new(|| Style {
    values: StyleId::ALL
        .iter()
        .map(|&id| (id, id.default_value()))
        .collect(),
});

/// The process-wide default style. Initialized on first use, never mutated.
pub fn default_style() -> &'static Style {
    &DEFAULT_STYLE
}

impl Default for Style {
    fn default() -> Self {
        default_style().clone()
    }
}

impl Style {
    /// Raw value for `id`.
    pub fn value(&self, id: StyleId) -> &StyleValue {
        // Every constructor starts from the default table, so all keys exist.
        &self.values[&id]
    }

    /// Real value for `id`, or `None` when `id` is not a real-valued key.
    pub fn value_f64(&self, id: StyleId) -> Option<f64> {
        match self.value(id) {
            StyleValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean value for `id`, or `None` when `id` is not a flag.
    pub fn value_bool(&self, id: StyleId) -> Option<bool> {
        match self.value(id) {
            StyleValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String value for `id`, or `None` when `id` is not a string key.
    pub fn value_str(&self, id: StyleId) -> Option<&str> {
        match self.value(id) {
            StyleValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Staff space of this style.
    pub fn spatium(&self) -> f64 {
        self.value_f64(StyleId::Spatium).unwrap_or(DEFAULT_SPATIUM)
    }

    /// Replace the value for `id`. The new value must have the same kind as the default.
    pub fn set(&mut self, id: StyleId, value: StyleValue) -> LayoutResult<()> {
        let current = self.value(id);
        if !current.same_kind(&value) {
            return Err(LayoutError::style(format!(
                "{id:?} expects a {} value, got {}",
                current.kind_name(),
                value.kind_name()
            )));
        }
        if let StyleValue::Real(v) = value
            && !v.is_finite()
        {
            return Err(LayoutError::style(format!("{id:?} must be finite")));
        }
        if id == StyleId::Spatium && matches!(value, StyleValue::Real(v) if v <= 0.0) {
            return Err(LayoutError::style("Spatium must be > 0"));
        }
        self.values.insert(id, value);
        Ok(())
    }

    /// Keys whose value differs from [`default_style`], with their values.
    pub fn overrides(&self) -> impl Iterator<Item = (StyleId, &StyleValue)> {
        self.values
            .iter()
            .filter(|(id, v)| default_style().value(**id) != *v)
            .map(|(id, v)| (*id, v))
    }
}

/// Engraving (SMuFL) font used to draw musical symbols.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngravingFont {
    /// Family name, e.g. `Leland` or `Bravura`.
    pub name: String,
}

/// Shared handle to an engraving font.
pub type FontHandle = Arc<EngravingFont>;

impl EngravingFont {
    /// Font named by `style`'s [`StyleId::MusicalSymbolFont`].
    pub fn for_style(style: &Style) -> FontHandle {
        let name = style
            .value_str(StyleId::MusicalSymbolFont)
            .unwrap_or("Leland")
            .to_string();
        Arc::new(EngravingFont { name })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/model.rs"]
mod tests;
