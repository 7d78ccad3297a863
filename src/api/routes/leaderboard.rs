use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::AggregationReport;
use crate::models::{FunctionRow, Metric, Mode, RankedRow, Series, Summary};

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse<'a> {
    pub mode: Mode,
    pub generated_at: DateTime<Utc>,
    pub fingerprint: &'a str,
    pub rows: &'a [RankedRow],
}

/// `If-None-Match` check with weak comparison; `*` matches any current tag.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|tag| {
        tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag
    })
}

pub async fn leaderboard(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let dashboard = state.require_dashboard().await?;
    let etag = format!("\"{}\"", dashboard.fingerprint);

    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| etag_matches(v, &etag));

    let etag_value =
        HeaderValue::from_str(&etag).map_err(|e| ApiError::Internal(e.to_string()))?;

    if unchanged {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
    }

    let body = LeaderboardResponse {
        mode: dashboard.mode,
        generated_at: dashboard.generated_at,
        fingerprint: &dashboard.fingerprint,
        rows: &dashboard.leaderboard,
    };
    Ok(([(header::ETAG, etag_value)], Json(body)).into_response())
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub mode: Mode,
    pub generated_at: DateTime<Utc>,
    pub entities: usize,
    pub source_rows: usize,
    #[serde(flatten)]
    pub summary: Summary,
    pub report: AggregationReport,
}

pub async fn summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, ApiError> {
    let dashboard = state.require_dashboard().await?;
    Ok(Json(SummaryResponse {
        mode: dashboard.mode,
        generated_at: dashboard.generated_at,
        entities: dashboard.leaderboard.len(),
        source_rows: dashboard.source_rows,
        summary: dashboard.summary.clone(),
        report: dashboard.report.clone(),
    }))
}

pub async fn all_series(State(state): State<AppState>) -> Result<Json<Vec<Series>>, ApiError> {
    let dashboard = state.require_dashboard().await?;
    Ok(Json(dashboard.series.clone()))
}

pub async fn series(
    State(state): State<AppState>,
    Path(metric): Path<String>,
) -> Result<Json<Series>, ApiError> {
    let metric = Metric::from_slug(&metric).ok_or_else(|| {
        let known: Vec<&str> = Metric::ALL.iter().map(|m| m.slug()).collect();
        ApiError::NotFound(format!(
            "metric '{}' (expected one of: {})",
            metric,
            known.join(", ")
        ))
    })?;

    let dashboard = state.require_dashboard().await?;
    dashboard
        .series_for(metric)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::Internal(format!("series '{}' missing", metric.slug())))
}

#[derive(Debug, Serialize)]
pub struct FunctionsResponse {
    pub functions: Vec<String>,
}

pub async fn functions(
    State(state): State<AppState>,
) -> Result<Json<FunctionsResponse>, ApiError> {
    let dashboard = state.require_dashboard().await?;
    Ok(Json(FunctionsResponse {
        functions: dashboard.functions.clone(),
    }))
}

#[derive(Debug, Serialize)]
pub struct FunctionDetailResponse {
    pub function: String,
    pub rows: Vec<FunctionRow>,
}

pub async fn function_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<FunctionDetailResponse>, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("function name must not be blank".to_string()));
    }

    let dashboard = state.require_dashboard().await?;
    let rows = dashboard
        .function_breakdown(&name)
        .ok_or_else(|| ApiError::NotFound(format!("function '{}'", name)))?;
    Ok(Json(FunctionDetailResponse {
        function: name,
        rows,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};

    use super::etag_matches;
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, ready_state, send, state_with};
    use crate::fetch::StaticSource;

    #[test]
    fn test_etag_matches() {
        let etag = "\"0011aabbccddeeff\"";

        assert!(etag_matches(etag, etag));
        assert!(etag_matches("W/\"0011aabbccddeeff\"", etag));
        assert!(etag_matches("\"stale\", W/\"0011aabbccddeeff\"", etag));
        assert!(etag_matches("*", etag));
        assert!(!etag_matches("\"stale\"", etag));
        assert!(!etag_matches("0011aabbccddeeff", etag));
    }

    #[tokio::test]
    async fn test_leaderboard_endpoint() {
        let app = build_router(ready_state().await);
        let (status, json) = get_json(app, "/api/leaderboard").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["mode"], "Total");
        let rows = json["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0]["entity"], "CC");
        assert_eq!(rows[0]["rank"], 1);
        assert_eq!(rows[0]["medal"], "gold");
        assert_eq!(rows[0]["label"], "🥇 CC");
        assert_eq!(rows[0]["score"], 10.0);

        assert_eq!(rows[1]["entity"], "CS");
        assert_eq!(rows[1]["medal"], "silver");

        assert_eq!(rows[2]["entity"], "CN");
        assert_eq!(rows[2]["rank"], "-");
        assert!(rows[2]["medal"].is_null());
    }

    #[tokio::test]
    async fn test_leaderboard_etag_not_modified() {
        let state = ready_state().await;
        let (status, headers, _) = send(
            build_router(state.clone()),
            Request::builder()
                .uri("/api/leaderboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let etag = headers.get(header::ETAG).unwrap().to_str().unwrap().to_string();

        let (status, _, body) = send(
            build_router(state),
            Request::builder()
                .uri("/api/leaderboard")
                .header(header::IF_NONE_MATCH, &etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_leaderboard_weak_etag_not_modified() {
        let state = ready_state().await;
        let fingerprint = state.refresher.dashboard().await.unwrap().fingerprint.clone();

        let (status, headers, _) = send(
            build_router(state),
            Request::builder()
                .uri("/api/leaderboard")
                .header(header::IF_NONE_MATCH, format!("W/\"{}\"", fingerprint))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);
        assert_eq!(
            headers.get(header::ETAG).unwrap(),
            format!("\"{}\"", fingerprint).as_str()
        );
    }

    #[tokio::test]
    async fn test_leaderboard_unavailable_before_first_refresh() {
        let app = build_router(state_with(StaticSource::from_csv("Entity\nCC\n")));
        let (status, json) = get_json(app, "/api/leaderboard").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_leaderboard_unavailable_reports_last_error() {
        let state = state_with(StaticSource::failing("sheet offline"));
        assert!(state.refresher.refresh_once().await.is_err());

        let (status, json) = get_json(build_router(state), "/api/leaderboard").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("sheet offline"));
    }

    #[tokio::test]
    async fn test_summary_endpoint() {
        let app = build_router(ready_state().await);
        let (status, json) = get_json(app, "/api/summary").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_applications"], 19.0);
        assert_eq!(json["total_approvals"], 14.0);
        assert_eq!(json["total_units"], 3.0);
        assert_eq!(json["conversion_rate"], 0.74);
        assert_eq!(json["entities"], 3);
        assert_eq!(json["report"]["coerced_cells"], 0);
    }

    #[tokio::test]
    async fn test_series_endpoints() {
        let state = ready_state().await;

        let (status, json) = get_json(build_router(state.clone()), "/api/series").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 6);

        let (status, json) = get_json(build_router(state.clone()), "/api/series/ratio").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["metric"], "ratio");
        assert_eq!(json["points"][0]["entity"], "CC");
        assert_eq!(json["points"][0]["value"], 66.67);
        assert_eq!(json["points"][1]["value"], 0.0);
        assert_eq!(json["points"][2]["value"], 100.0);

        let (status, _) = get_json(build_router(state), "/api/series/bogus").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_function_endpoints() {
        let state = ready_state().await;

        let (status, json) = get_json(build_router(state.clone()), "/api/functions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["functions"], serde_json::json!(["oGV", "iGTa"]));

        let (status, json) = get_json(build_router(state.clone()), "/api/functions/oGV").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["function"], "oGV");
        assert_eq!(json["rows"][0]["entity"], "CC");
        assert_eq!(json["rows"][0]["sign_ups"], 3.0);
        assert_eq!(json["rows"][1]["entity"], "CS");

        let (status, _) = get_json(build_router(state), "/api/functions/oGTe").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_function_detail_blank_name() {
        let app = build_router(ready_state().await);
        let (status, json) = get_json(app, "/api/functions/%20").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }
}
