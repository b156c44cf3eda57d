//! Reactive update graph for the catchment dashboard.
//!
//! A [`Binding`] names its input controls, the single output it writes and a
//! [`FirePolicy`]. The [`UpdateGraph`] owns the bindings and, for every
//! control change in a [`Session`], fires the bindings that depend on it one
//! after another, recording each result in the session's view state.

pub mod binding;
pub mod bindings;
pub mod control;
pub mod figure;
pub mod graph;
pub mod view;

pub use binding::{Binding, BindingContext, BindingError, BindingOutcome, FirePolicy, Services};
pub use control::{ControlId, ControlKind, ControlSpec, ControlState, ControlValue, DropdownOption};
pub use figure::{Figure, Table, Trace, XValues};
pub use graph::{GraphError, Session, UpdateGraph};
pub use view::{OutputTarget, OutputUpdate, OutputValue, Rendered, ViewState};
