//! Application state for the dashboard.

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use data_adapters::http::build_client;
use data_adapters::{DataAdapter, HttpAdapter, ReferenceData, ReferenceLoader};
use tracing::info;
use update_graph::{Services, Session, UpdateGraph};

use crate::config::{DashboardConfig, ReferenceConfig};
use crate::layout::{Dataset, Layout, Variant};

/// Shared application state.
pub struct AppState {
    pub variant: Variant,

    /// Controls and bindings of the selected variant.
    pub graph: UpdateGraph,

    /// The single process-wide session. Held for a whole dispatch, so
    /// events are applied one at a time.
    pub session: Mutex<Session>,

    pub layout: Layout,

    /// Static datasets, read-only after startup.
    pub reference: Arc<ReferenceData>,
}

impl AppState {
    /// Load reference data and wire the HTTP adapter for `variant`.
    ///
    /// Fails if any configured or required dataset cannot be loaded.
    pub async fn new(
        config: DashboardConfig,
        variant: Variant,
        service_url: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = build_client(request_timeout).context("Failed to build HTTP client")?;
        let loader = ReferenceLoader::new(client.clone());
        let reference = load_reference(&loader, &config.reference, variant).await?;
        let adapter = HttpAdapter::with_client(client, config.products);

        Self::build(variant, service_url, Arc::new(adapter), reference).await
    }

    /// Assemble the layout, graph and initialized session.
    pub async fn build(
        variant: Variant,
        service_url: &str,
        adapter: Arc<dyn DataAdapter>,
        reference: ReferenceData,
    ) -> Result<Self> {
        let reference = Arc::new(reference);
        let layout = Layout::build(variant, service_url, &reference);

        let services = Services::new(adapter, Arc::clone(&reference));
        let mut graph = UpdateGraph::new(layout.controls.clone(), services);
        for binding in variant.bindings() {
            graph
                .register(binding)
                .with_context(|| format!("Invalid bindings for variant {:?}", variant))?;
        }

        let mut session = graph.new_session();
        let updates = graph.initialize(&mut session).await;
        info!(
            variant = ?variant,
            bindings = graph.bindings().len(),
            initial_outputs = updates.len(),
            "Dashboard state ready"
        );

        Ok(Self {
            variant,
            graph,
            session: Mutex::new(session),
            layout,
            reference,
        })
    }

    /// Required datasets that are not loaded.
    pub fn missing_datasets(&self) -> Vec<Dataset> {
        self.variant
            .required_datasets()
            .iter()
            .copied()
            .filter(|d| !is_loaded(&self.reference, *d))
            .collect()
    }
}

fn is_loaded(reference: &ReferenceData, dataset: Dataset) -> bool {
    match dataset {
        Dataset::Catchments => reference.catchments.is_some(),
        Dataset::Drought => reference.drought.is_some(),
    }
}

/// Load the datasets `variant` uses. Only the ones it uses are fetched.
async fn load_reference(
    loader: &ReferenceLoader,
    config: &ReferenceConfig,
    variant: Variant,
) -> Result<ReferenceData> {
    let mut reference = ReferenceData::default();
    let required = variant.required_datasets();

    if required.contains(&Dataset::Catchments) {
        let Some(catchments) = &config.catchments else {
            bail!("Variant {:?} needs a catchments dataset", variant);
        };
        reference.catchments = Some(
            loader
                .load_catchments(&catchments.source, catchments.id_property.clone())
                .await
                .with_context(|| format!("Failed to load catchments from {}", catchments.source))?,
        );
    }

    if required.contains(&Dataset::Drought) {
        let Some(source) = &config.drought else {
            bail!("Variant {:?} needs a drought dataset", variant);
        };
        reference.drought = Some(
            loader
                .load_series(source)
                .await
                .with_context(|| format!("Failed to load drought series from {}", source))?,
        );
    }

    if variant.uses_sample_surface() {
        if let Some(source) = &config.sample_surface {
            reference.sample_surface = Some(
                loader
                    .load_matrix(source)
                    .await
                    .with_context(|| format!("Failed to load sample surface from {}", source))?,
            );
        }
    }

    Ok(reference)
}
