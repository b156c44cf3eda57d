//! Dispatcher: routes control changes to the bindings that depend on them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::binding::{Binding, BindingContext, BindingOutcome, FirePolicy, Services};
use crate::control::{ControlId, ControlSpec, ControlState, ControlValue};
use crate::view::{OutputTarget, OutputUpdate, Rendered, ViewState};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Unknown control: {0}")]
    UnknownControl(String),

    #[error("Invalid value for '{control}': {message}")]
    InvalidValue { control: String, message: String },

    #[error("Output {target} is already written by binding {existing}")]
    DuplicateOutput { target: String, existing: String },

    #[error("Binding {binding} reads undeclared control {control}")]
    UndeclaredInput { binding: String, control: String },
}

/// Per-session mutable state: control values and what each output shows.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub controls: ControlState,
    pub view: ViewState,
}

/// The declared controls and the bindings between them and the outputs.
pub struct UpdateGraph {
    controls: BTreeMap<ControlId, ControlSpec>,
    bindings: Vec<Arc<dyn Binding>>,
    services: Services,
}

impl UpdateGraph {
    pub fn new(controls: Vec<ControlSpec>, services: Services) -> Self {
        Self {
            controls: controls.into_iter().map(|s| (s.id.clone(), s)).collect(),
            bindings: Vec::new(),
            services,
        }
    }

    /// Register a binding. Inputs must be declared controls and no other
    /// binding may already write the same output.
    pub fn register(&mut self, binding: Arc<dyn Binding>) -> Result<(), GraphError> {
        for input in binding.inputs() {
            if !self.controls.contains_key(input) {
                return Err(GraphError::UndeclaredInput {
                    binding: binding.name().to_string(),
                    control: input.to_string(),
                });
            }
        }

        if let Some(existing) = self.bindings.iter().find(|b| b.output() == binding.output()) {
            return Err(GraphError::DuplicateOutput {
                target: binding.output().to_string(),
                existing: existing.name().to_string(),
            });
        }

        debug!(binding = binding.name(), output = %binding.output(), "Registered binding");
        self.bindings.push(binding);
        Ok(())
    }

    pub fn controls(&self) -> impl Iterator<Item = &ControlSpec> {
        self.controls.values()
    }

    pub fn bindings(&self) -> &[Arc<dyn Binding>] {
        &self.bindings
    }

    pub fn outputs(&self) -> BTreeSet<&OutputTarget> {
        self.bindings.iter().map(|b| b.output()).collect()
    }

    /// A session seeded with every control's default value.
    pub fn new_session(&self) -> Session {
        Session {
            controls: ControlState::from_specs(self.controls.values()),
            view: ViewState::default(),
        }
    }

    /// Fire every `FiresOnInit` binding once, with no trigger.
    #[instrument(skip_all)]
    pub async fn initialize(&self, session: &mut Session) -> Vec<OutputUpdate> {
        let mut updates = Vec::new();
        for binding in &self.bindings {
            if binding.policy() != FirePolicy::FiresOnInit {
                continue;
            }
            if let Some(update) = self.fire(binding.as_ref(), session, None).await {
                updates.push(update);
            }
        }
        info!(fired = updates.len(), "Initialized session outputs");
        updates
    }

    /// Validate a raw event value and apply it.
    pub async fn dispatch(
        &self,
        session: &mut Session,
        control: &str,
        raw: &serde_json::Value,
    ) -> Result<Vec<OutputUpdate>, GraphError> {
        let id = ControlId::from(control);
        let spec = self
            .controls
            .get(&id)
            .ok_or_else(|| GraphError::UnknownControl(control.to_string()))?;
        let value = spec.parse_value(raw).map_err(|message| GraphError::InvalidValue {
            control: control.to_string(),
            message,
        })?;
        Ok(self.apply(session, id, value).await)
    }

    /// Store a control value and fire the bindings that read it.
    ///
    /// Nothing fires when the value is unchanged. Dependent bindings run in
    /// registration order, each to completion, all against the same
    /// control snapshot.
    #[instrument(skip_all, fields(control = %id))]
    pub async fn apply(
        &self,
        session: &mut Session,
        id: ControlId,
        value: ControlValue,
    ) -> Vec<OutputUpdate> {
        counter!("dash_events_total").increment(1);

        if !session.controls.set(id.clone(), value) {
            debug!("Control value unchanged, nothing fires");
            return Vec::new();
        }

        let mut updates = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.inputs().contains(&id)) {
            if let Some(update) = self.fire(binding.as_ref(), session, Some(&id)).await {
                updates.push(update);
            }
        }
        updates
    }

    async fn fire(
        &self,
        binding: &dyn Binding,
        session: &mut Session,
        trigger: Option<&ControlId>,
    ) -> Option<OutputUpdate> {
        let ctx = BindingContext {
            controls: &session.controls,
            trigger,
            services: &self.services,
        };

        let rendered = match binding.compute(&ctx).await {
            Ok(BindingOutcome::Update(value)) => {
                record_fire(binding.name(), "update");
                Rendered::Value(value)
            }
            Ok(BindingOutcome::NoUpdate) => {
                record_fire(binding.name(), "no_update");
                debug!(binding = binding.name(), "Binding declined to update");
                return None;
            }
            Err(e) => {
                record_fire(binding.name(), "error");
                warn!(binding = binding.name(), error = %e, "Binding failed");
                Rendered::Error(e.to_string())
            }
        };

        session
            .view
            .replace(binding.output().clone(), rendered.clone());

        Some(OutputUpdate {
            target: binding.output().clone(),
            binding: binding.name().to_string(),
            rendered,
        })
    }
}

fn record_fire(binding: &str, outcome: &'static str) {
    counter!(
        "dash_binding_fires_total",
        "binding" => binding.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
