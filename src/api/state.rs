use std::sync::Arc;

use crate::api::ApiError;
use crate::models::Mode;
use crate::pipeline::Dashboard;
use crate::refresh::Refresher;

#[derive(Clone)]
pub struct AppState {
    pub refresher: Arc<Refresher>,
    pub title: Arc<str>,
    pub mode: Mode,
}

impl AppState {
    pub fn new(refresher: Arc<Refresher>, title: &str, mode: Mode) -> Self {
        Self {
            refresher,
            title: Arc::from(title),
            mode,
        }
    }

    /// Current dashboard, or 503 with the reason there is none.
    pub async fn require_dashboard(&self) -> Result<Arc<Dashboard>, ApiError> {
        if let Some(dashboard) = self.refresher.dashboard().await {
            return Ok(dashboard);
        }
        let state = self.refresher.state().await;
        Err(ApiError::Unavailable(
            state
                .last_error
                .unwrap_or_else(|| "the first refresh has not completed yet".to_string()),
        ))
    }
}
