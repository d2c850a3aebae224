use std::sync::Arc;

use crate::journal::analysis::AnalysisService;
use crate::journal::repository::EntryRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres-backed in production, in-memory when no database is configured.
    pub entries: Arc<dyn EntryRepository>,
    pub analysis: AnalysisService,
}
