// Application state shared by the HTTP handlers and the JSON-RPC dispatcher.

use std::sync::Arc;

use crate::config::ProjectDefaults;
use crate::db::DataClient;

/// Central application state. Clone-friendly: the backing client sits behind
/// an `Arc` and is never mutated after construction.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn DataClient>,
    /// Default organization / project identifiers from the config file.
    pub defaults: ProjectDefaults,
}

impl AppState {
    pub fn new(client: Arc<dyn DataClient>, defaults: ProjectDefaults) -> Self {
        tracing::info!(
            organization_id = defaults.organization_id.as_deref().unwrap_or("-"),
            project_id = defaults.project_id.as_deref().unwrap_or("-"),
            "AppState initialised"
        );
        Self {
            client,
            defaults,
        }
    }

    pub fn client(&self) -> &dyn DataClient {
        self.client.as_ref()
    }
}
