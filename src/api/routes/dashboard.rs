use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::render::{render_page, PageView};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub function: Option<String>,
}

/// The dashboard page. Renders the last good snapshot, any refresh error,
/// or a loading notice before the first cycle finishes.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let dashboard = state.refresher.dashboard().await;
    let refresh_state = state.refresher.state().await;

    let view = PageView {
        title: &state.title,
        mode: state.mode,
        refresh_seconds: state.refresher.interval().as_secs().max(1),
        dashboard: dashboard.as_deref(),
        state: &refresh_state,
        function: query.function.as_deref(),
    };
    Html(render_page(&view))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
