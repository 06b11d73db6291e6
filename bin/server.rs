// Sales Dashboard - Web Server
// Read-only JSON API over the filter/aggregate pipeline

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use anyhow::Context;
use sales_dashboard::logging::{self, LogTarget};
use sales_dashboard::{
    aggregate_with_limit, apply_or_unfiltered, load_config, load_csv, region_catalog, FilterOptions,
    FilterSpec, SalesTable, View, VERSION,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
///
/// The table is never mutated after load, so sessions share it without a lock.
#[derive(Clone)]
struct AppState {
    table: Arc<SalesTable>,
    top_n: usize,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            warning: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            warning: None,
        }
    }

    fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }
}

/// Query string of GET /api/views/:view
///
/// Lists are comma separated; anything omitted keeps its default
#[derive(Debug, Default, Deserialize)]
struct ViewQuery {
    start: Option<String>,
    end: Option<String>,
    categories: Option<String>,
    regions: Option<String>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ViewQuery {
    /// Build the filter spec for this request
    ///
    /// Unparseable dates are reported as a warning and the defaults are used,
    /// the same degrade-don't-crash policy as a failing filter.
    fn to_spec(&self, table: &SalesTable) -> (FilterSpec, Option<String>) {
        let defaults = FilterSpec::defaults(table);

        let categories = match &self.categories {
            Some(raw) => split_list(raw),
            None => defaults.categories().iter().cloned().collect(),
        };
        let regions = match &self.regions {
            Some(raw) => split_list(raw),
            None => defaults.regions().iter().cloned().collect(),
        };

        let start = self.start.clone().unwrap_or_else(|| defaults.start().to_string());
        let end = self.end.clone().unwrap_or_else(|| defaults.end().to_string());

        match FilterSpec::parse(&start, &end, categories.clone(), regions.clone()) {
            Ok(spec) => (spec, None),
            Err(err) => {
                tracing::warn!(error = %err, "bad date bounds in query");
                (
                    FilterSpec::new(defaults.start(), defaults.end(), categories, regions),
                    Some(err.to_string()),
                )
            }
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/options - Values to offer in the filter widgets
async fn get_options(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(FilterOptions::from_table(&state.table)))
}

/// GET /api/regions - Region catalog
async fn get_regions(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(region_catalog(&state.table)))
}

/// GET /api/views/:view - Aggregate for one dashboard tab
async fn get_view(
    State(state): State<AppState>,
    Path(view): Path<String>,
    Query(query): Query<ViewQuery>,
) -> impl IntoResponse {
    let view: View = match view.parse() {
        Ok(view) => view,
        Err(err) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::err(format!("{}", err))),
            )
                .into_response();
        }
    };

    let (spec, query_warning) = query.to_spec(&state.table);
    let outcome = apply_or_unfiltered(&state.table, &spec);
    let result = aggregate_with_limit(&outcome.table, view, state.top_n);

    let warning = query_warning.or_else(|| {
        outcome
            .warning
            .as_ref()
            .map(|w| format!("Error filtering data: {} (showing all rows)", w))
    });

    (StatusCode::OK, Json(ApiResponse::ok(result).with_warning(warning))).into_response()
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/options", get(get_options))
        .route("/regions", get(get_regions))
        .route("/views/:view", get(get_view))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::initialize(LogTarget::Stderr)?;

    let config = load_config(None)?;
    let data_path = config.data_path();

    let table = load_csv(&data_path)
        .with_context(|| format!("cannot load sales data from {}", data_path.display()))?;

    let state = AppState {
        table: Arc::new(table),
        top_n: config.dashboard.top_n,
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr).await?;

    tracing::info!(addr = %config.server.addr, version = VERSION, "server listening");
    println!("\n🚀 Sales dashboard v{} running on http://{}", VERSION, config.server.addr);
    println!("   API: http://{}/api/views/overview", config.server.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sales_dashboard::load_from_reader;
    use tower::ServiceExt;

    fn state() -> AppState {
        let csv = "\
data,regiao,categoria,vendedor,produto,cliente,valor,quantidade
01/01/2024,Sul,Eletrônicos,Ana,Notebook,Cli A,100,1
02/01/2024,Sudeste,Móveis,Bruno,Cadeira,Cli B,50,2
";
        AppState {
            table: Arc::new(load_from_reader(csv.as_bytes()).unwrap()),
            top_n: 10,
        }
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_regions_include_reference_region() {
        let (_, body) = get_json("/api/regions").await;
        let regions = body["data"].as_array().unwrap();
        assert_eq!(regions.len(), 5);
        assert!(regions.iter().any(|r| r == "Centro-Oeste"));
    }

    #[tokio::test]
    async fn test_overview_with_defaults() {
        let (status, body) = get_json("/api/views/overview").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["view"], "overview");
        assert_eq!(body["data"]["result"]["summary"]["transaction_count"], 2);
        assert_eq!(body["data"]["result"]["daily"]["status"], "ready");
        assert!(body.get("warning").is_none());
    }

    #[tokio::test]
    async fn test_empty_overview_reports_zero_totals() {
        let (_, body) = get_json("/api/views/overview?start=01/01/2030&end=31/01/2030").await;
        let result = &body["data"]["result"];
        assert_eq!(result["summary"]["transaction_count"], 0);
        assert_eq!(
            result["summary"]["total_amount"].to_string().trim_matches('"').parse::<f64>().unwrap(),
            0.0
        );
        for chart in ["daily", "by_category", "by_region", "map"] {
            assert_eq!(result[chart]["status"], "no_data", "{chart}");
        }
    }

    #[tokio::test]
    async fn test_filtered_view_reports_no_data() {
        let (_, body) = get_json("/api/views/sellers?start=01/06/2024&end=30/06/2024").await;
        assert_eq!(body["data"]["result"]["status"], "no_data");
    }

    #[tokio::test]
    async fn test_region_filter() {
        let (_, body) = get_json("/api/views/sellers?regions=Sul").await;
        let ranking = body["data"]["result"]["data"]["ranking"].as_array().unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0]["seller"], "Ana");
    }

    #[tokio::test]
    async fn test_inverted_range_warns_and_falls_back() {
        let (_, body) = get_json("/api/views/customers?start=2024-01-02&end=2024-01-01").await;
        assert_eq!(body["success"], true);
        assert!(body["warning"].as_str().unwrap().contains("Error filtering data"));
        assert_eq!(body["data"]["result"]["status"], "ready");
    }

    #[tokio::test]
    async fn test_bad_date_warns() {
        let (_, body) = get_json("/api/views/products?start=tomorrow").await;
        assert!(body["warning"].as_str().unwrap().contains("tomorrow"));
        assert_eq!(body["data"]["result"]["status"], "ready");
    }

    #[tokio::test]
    async fn test_unknown_view_is_404() {
        let (status, body) = get_json("/api/views/maps").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
