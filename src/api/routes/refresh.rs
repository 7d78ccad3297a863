use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::refresh::RefreshState;

/// Get current refresh status.
pub async fn status(State(state): State<AppState>) -> Json<RefreshState> {
    Json(state.refresher.state().await)
}

/// Start a refresh cycle in the background.
pub async fn start(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RefreshState>), ApiError> {
    if !state.refresher.try_begin().await {
        return Err(ApiError::Conflict("A refresh is already running".to_string()));
    }

    info!("Manual refresh requested");
    let accepted = state.refresher.state().await;
    let refresher = state.refresher.clone();
    tokio::spawn(async move {
        // Outcome is recorded in the refresh state
        let _ = refresher.run_started().await;
    });

    Ok((StatusCode::ACCEPTED, Json(accepted)))
}
