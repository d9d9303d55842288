//! Application state shared across all route handlers.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use wayfarer_chat::TravelOrchestrator;
use wayfarer_core::WayfarerConfig;
use wayfarer_sos::SosService;
use wayfarer_storage::LocationRepository;

/// Shared application state, passed to handlers via axum's `State` extractor.
///
/// All fields are cheap to clone; the orchestrator owns the session store.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Mutex<WayfarerConfig>>,
    pub orchestrator: Arc<TravelOrchestrator>,
    pub sos: Arc<SosService>,
    /// Last reported position of each user.
    pub locations: LocationRepository,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: WayfarerConfig,
        orchestrator: TravelOrchestrator,
        sos: Arc<SosService>,
        locations: LocationRepository,
    ) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            orchestrator: Arc::new(orchestrator),
            sos,
            locations,
            start_time: Instant::now(),
        }
    }
}
