//! Derived view state: the latest rendering of every output.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::figure::{Figure, Table};

/// Identifier of a visual property, `"<component>.<property>"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputTarget(String);

impl OutputTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Component part of the target (before the first dot).
    pub fn component(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl From<&str> for OutputTarget {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value written to an output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutputValue {
    Text(String),
    LayerParams(BTreeMap<String, serde_json::Value>),
    Figure(Figure),
    Table(Table),
}

impl OutputValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutputValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_layer_params(&self) -> Option<&BTreeMap<String, serde_json::Value>> {
        match self {
            OutputValue::LayerParams(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_figure(&self) -> Option<&Figure> {
        match self {
            OutputValue::Figure(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            OutputValue::Table(t) => Some(t),
            _ => None,
        }
    }
}

/// What a panel currently shows: a value or the error of its last firing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rendered {
    Value(OutputValue),
    Error(String),
}

impl Rendered {
    pub fn value(&self) -> Option<&OutputValue> {
        match self {
            Rendered::Value(v) => Some(v),
            Rendered::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Rendered::Error(e) => Some(e),
            Rendered::Value(_) => None,
        }
    }
}

/// One output written during a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputUpdate {
    pub target: OutputTarget,
    pub binding: String,
    pub rendered: Rendered,
}

/// Latest rendering per output target. Entries are replaced, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewState {
    outputs: BTreeMap<OutputTarget, Rendered>,
}

impl ViewState {
    pub fn get(&self, target: &OutputTarget) -> Option<&Rendered> {
        self.outputs.get(target)
    }

    /// Current value of a target, if it holds one.
    pub fn value(&self, target: &OutputTarget) -> Option<&OutputValue> {
        self.get(target).and_then(Rendered::value)
    }

    pub fn replace(&mut self, target: OutputTarget, rendered: Rendered) {
        self.outputs.insert(target, rendered);
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
