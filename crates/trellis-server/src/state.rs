use std::sync::Arc;

use trellis_dispatch::Dispatcher;
use trellis_llm::ModelRouter;
use trellis_metrics::MetricsAggregator;
use trellis_store::SessionStore;

/// Shared handles for the HTTP handlers. The same four components also
/// back the platform listener, so both surfaces observe one gateway.
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub router: Arc<ModelRouter>,
    pub metrics: Arc<MetricsAggregator>,
    pub dispatcher: Arc<Dispatcher>,
    /// True when the platform listener was configured at startup.
    pub platform_configured: bool,
}

impl AppState {
    pub fn new(
        store: Arc<SessionStore>,
        router: Arc<ModelRouter>,
        metrics: Arc<MetricsAggregator>,
        dispatcher: Arc<Dispatcher>,
        platform_configured: bool,
    ) -> Self {
        Self {
            store,
            router,
            metrics,
            dispatcher,
            platform_configured,
        }
    }
}
