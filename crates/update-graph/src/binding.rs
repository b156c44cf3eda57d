//! The binding contract: inputs, one output, a fire policy and a computation.

use std::sync::Arc;

use async_trait::async_trait;
use data_adapters::{AdapterError, DataAdapter, ReferenceData};
use thiserror::Error;

use crate::control::{ControlId, ControlState};
use crate::view::{OutputTarget, OutputValue};

/// When a binding may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirePolicy {
    /// Fires once at session initialization and on every input change.
    FiresOnInit,
    /// Fires only after one of its inputs actually changed.
    FiresOnlyOnChange,
}

/// Result of a firing.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingOutcome {
    /// Replace the output with this value.
    Update(OutputValue),
    /// Keep whatever the output currently shows.
    NoUpdate,
}

#[derive(Debug, Error)]
pub enum BindingError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Expected a {expected} from product {product}, got a {got}")]
    UnexpectedPayload {
        product: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("No value for control {0}")]
    MissingInput(ControlId),

    #[error("Reference dataset not loaded: {0}")]
    MissingReference(&'static str),

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
}

/// Process-scoped collaborators handed to every binding.
#[derive(Clone)]
pub struct Services {
    pub adapter: Arc<dyn DataAdapter>,
    pub reference: Arc<ReferenceData>,
}

impl Services {
    pub fn new(adapter: Arc<dyn DataAdapter>, reference: Arc<ReferenceData>) -> Self {
        Self { adapter, reference }
    }
}

/// What a binding sees while it computes.
pub struct BindingContext<'a> {
    /// Snapshot of every control at firing time.
    pub controls: &'a ControlState,
    /// Control whose change fired the binding; `None` during initialization.
    pub trigger: Option<&'a ControlId>,
    pub services: &'a Services,
}

impl<'a> BindingContext<'a> {
    /// Whether this firing comes from a real control change.
    pub fn triggered_by_user(&self) -> bool {
        self.trigger.is_some()
    }

    /// Numeric control value, failing if absent.
    pub fn number(&self, id: &ControlId) -> Result<f64, BindingError> {
        self.controls
            .number(id)
            .ok_or_else(|| BindingError::MissingInput(id.clone()))
    }
}

/// An input-controls-to-output rule.
#[async_trait]
pub trait Binding: Send + Sync {
    fn name(&self) -> &str;

    fn inputs(&self) -> &[ControlId];

    fn output(&self) -> &OutputTarget;

    fn policy(&self) -> FirePolicy {
        FirePolicy::FiresOnInit
    }

    async fn compute(&self, ctx: &BindingContext<'_>) -> Result<BindingOutcome, BindingError>;
}
