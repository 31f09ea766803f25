//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::SessionCoordinator;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Coordinator for every room interaction.
    pub coordinator: Arc<SessionCoordinator>,
}

impl AppState {
    /// Wraps `coordinator` for sharing across handlers.
    #[must_use]
    pub fn new(coordinator: SessionCoordinator) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
        }
    }
}
