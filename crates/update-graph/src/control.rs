//! Controls: identifiers, declared kinds and the current values.

use dash_common::{Feature, FeatureCollection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a control property, `"<component>.<property>"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlId(String);

impl ControlId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ControlId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current value of a control.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlValue {
    Number(f64),
    Text(String),
    Geometry(FeatureCollection),
    Feature(Box<Feature>),
    Null,
}

impl ControlValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ControlValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ControlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_geometry(&self) -> Option<&FeatureCollection> {
        match self {
            ControlValue::Geometry(fc) => Some(fc),
            _ => None,
        }
    }

    pub fn as_feature(&self) -> Option<&Feature> {
        match self {
            ControlValue::Feature(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ControlValue::Null)
    }
}

/// One entry of a dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: ControlValue,
}

/// What kind of input a control is, and the values it accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ControlKind {
    /// Numeric range with fixed tick marks.
    Slider {
        min: f64,
        max: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
        marks: Vec<f64>,
    },
    /// Enumerated selectable values.
    Dropdown {
        options: Vec<DropdownOption>,
        clearable: bool,
        /// Whole numbers outside `options` are accepted too.
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        any_integer: bool,
    },
    /// The map's draw/edit layer, reporting a FeatureCollection.
    EditControl,
    /// A feature under the pointer on a GeoJSON layer.
    Hover,
}

/// Upper bound on generated slider marks.
pub const MAX_SLIDER_MARKS: usize = 1_000;

/// Declaration of a control in the layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSpec {
    pub id: ControlId,
    pub label: String,
    #[serde(flatten)]
    pub kind: ControlKind,
    pub default: ControlValue,
}

impl ControlSpec {
    /// Slider with marks every `mark_step` from `min` to `max`.
    ///
    /// A step that is not a positive number, or that would need more than
    /// [`MAX_SLIDER_MARKS`] marks, marks only the two ends.
    pub fn slider(id: &str, label: &str, min: f64, max: f64, mark_step: f64, default: f64) -> Self {
        let count = (max - min) / mark_step;
        let marks = if mark_step > 0.0 && count >= 0.0 && count <= MAX_SLIDER_MARKS as f64 {
            (0..=count.round() as usize)
                .map(|i| min + i as f64 * mark_step)
                .collect()
        } else {
            vec![min, max]
        };
        Self {
            id: id.into(),
            label: label.to_string(),
            kind: ControlKind::Slider {
                min,
                max,
                step: None,
                marks,
            },
            default: ControlValue::Number(default),
        }
    }

    pub fn dropdown(
        id: &str,
        label: &str,
        options: Vec<DropdownOption>,
        clearable: bool,
        default: ControlValue,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.to_string(),
            kind: ControlKind::Dropdown {
                options,
                clearable,
                any_integer: false,
            },
            default,
        }
    }

    /// Let a dropdown also take any whole number, not just its options.
    pub fn accepting_any_integer(mut self) -> Self {
        if let ControlKind::Dropdown { any_integer, .. } = &mut self.kind {
            *any_integer = true;
        }
        self
    }

    pub fn edit_control(id: &str) -> Self {
        Self {
            id: id.into(),
            label: "Draw".to_string(),
            kind: ControlKind::EditControl,
            default: ControlValue::Geometry(FeatureCollection::new()),
        }
    }

    pub fn hover(id: &str) -> Self {
        Self {
            id: id.into(),
            label: "Hover".to_string(),
            kind: ControlKind::Hover,
            default: ControlValue::Null,
        }
    }

    /// Validate a raw JSON event value against this control.
    pub fn parse_value(&self, raw: &serde_json::Value) -> Result<ControlValue, String> {
        match &self.kind {
            ControlKind::Slider { min, max, .. } => {
                let n = raw
                    .as_f64()
                    .ok_or_else(|| format!("expected a number, got {}", raw))?;
                if n < *min || n > *max {
                    return Err(format!("{} is outside [{}, {}]", n, min, max));
                }
                Ok(ControlValue::Number(n))
            }
            ControlKind::Dropdown {
                options,
                clearable,
                any_integer,
            } => {
                let value = match raw {
                    serde_json::Value::Null if *clearable => return Ok(ControlValue::Null),
                    serde_json::Value::Number(n) => ControlValue::Number(
                        n.as_f64().ok_or_else(|| format!("unrepresentable number {}", n))?,
                    ),
                    serde_json::Value::String(s) => ControlValue::Text(s.clone()),
                    other => return Err(format!("expected an option value, got {}", other)),
                };
                let whole = matches!(value, ControlValue::Number(n) if n.fract() == 0.0);
                if options.iter().any(|o| o.value == value) || (*any_integer && whole) {
                    Ok(value)
                } else {
                    Err(format!("{} is not one of the options", raw))
                }
            }
            ControlKind::EditControl => match raw {
                serde_json::Value::Null => Ok(ControlValue::Geometry(FeatureCollection::new())),
                other => serde_json::from_value::<FeatureCollection>(other.clone())
                    .map(ControlValue::Geometry)
                    .map_err(|e| format!("expected a FeatureCollection: {}", e)),
            },
            ControlKind::Hover => match raw {
                serde_json::Value::Null => Ok(ControlValue::Null),
                other => serde_json::from_value::<Feature>(other.clone())
                    .map(|f| ControlValue::Feature(Box::new(f)))
                    .map_err(|e| format!("expected a Feature: {}", e)),
            },
        }
    }
}

/// Current value of every declared control.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ControlState {
    values: BTreeMap<ControlId, ControlValue>,
}

impl ControlState {
    /// Seed state from control defaults.
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a ControlSpec>) -> Self {
        Self {
            values: specs
                .into_iter()
                .map(|s| (s.id.clone(), s.default.clone()))
                .collect(),
        }
    }

    pub fn get(&self, id: &ControlId) -> Option<&ControlValue> {
        self.values.get(id)
    }

    /// Store a value, returning whether it differs from the previous one.
    pub fn set(&mut self, id: ControlId, value: ControlValue) -> bool {
        match self.values.get(&id) {
            Some(current) if *current == value => false,
            _ => {
                self.values.insert(id, value);
                true
            }
        }
    }

    pub fn number(&self, id: &ControlId) -> Option<f64> {
        self.get(id).and_then(ControlValue::as_number)
    }

    pub fn text(&self, id: &ControlId) -> Option<&str> {
        self.get(id).and_then(ControlValue::as_text)
    }

    pub fn geometry(&self, id: &ControlId) -> Option<&FeatureCollection> {
        self.get(id).and_then(ControlValue::as_geometry)
    }

    pub fn feature(&self, id: &ControlId) -> Option<&Feature> {
        self.get(id).and_then(ControlValue::as_feature)
    }
}
