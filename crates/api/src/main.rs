use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use fba_core::domain::product::{ProductCandidate, ProductReport, ProfitabilityResult};
use fba_core::pricing::{filter_profitable, FilterThresholds};
use fba_core::scanner::{AnalyzeRequest, ArbitrageScanner};
use fba_core::ArbitrageError;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
// Oldest reports are dropped past this; the list lives only as long as the process.
const MAX_STORED_REPORTS: usize = 10_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = fba_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let scanner = ArbitrageScanner::from_settings(&settings)?;
    tracing::info!(
        page_fetcher = scanner.page_fetcher_name(),
        catalog = scanner.catalog_name().unwrap_or("none"),
        "scanner ready"
    );

    let state = AppState::new(scanner, FilterThresholds::from_settings(&settings));

    let cors_origin =
        std::env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>()?)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let app = router(state).layer(cors).layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/analyze", post(analyze_candidate))
        .route("/analyze-product", post(analyze_product))
        .route("/profitable-products", get(profitable_products))
        .with_state(state)
}

#[derive(Clone)]
struct AppState {
    scanner: Arc<ArbitrageScanner>,
    thresholds: FilterThresholds,
    reports: Arc<RwLock<VecDeque<ApiReport>>>,
}

impl AppState {
    fn new(scanner: ArbitrageScanner, thresholds: FilterThresholds) -> Self {
        Self {
            scanner: Arc::new(scanner),
            thresholds,
            reports: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    async fn remember(&self, report: ProductReport) -> ApiReport {
        let stored = ApiReport {
            id: Uuid::new_v4(),
            report,
        };

        let mut reports = self.reports.write().await;
        if reports.len() >= MAX_STORED_REPORTS {
            reports.pop_front();
        }
        reports.push_back(stored.clone());
        stored
    }
}

#[derive(Debug, Clone, Serialize)]
struct ApiReport {
    id: Uuid,
    #[serde(flatten)]
    report: ProductReport,
}

impl AsRef<ProfitabilityResult> for ApiReport {
    fn as_ref(&self) -> &ProfitabilityResult {
        &self.report.profitability
    }
}

struct ApiError(ArbitrageError);

impl From<ArbitrageError> for ApiError {
    fn from(err: ArbitrageError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ArbitrageError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ArbitrageError::NotFound(_) => StatusCode::NOT_FOUND,
            ArbitrageError::DivisionUndefined => StatusCode::UNPROCESSABLE_ENTITY,
            ArbitrageError::CollaboratorUnavailable { .. } => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            let err = anyhow::Error::new(self.0.clone());
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "request failed");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "FBA Arbitrage Finder API" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn analyze_candidate(
    State(state): State<AppState>,
    Json(candidate): Json<ProductCandidate>,
) -> Result<Json<ApiReport>, ApiError> {
    let report = state.scanner.analyze_candidate(candidate)?;
    Ok(Json(state.remember(report).await))
}

async fn analyze_product(
    State(state): State<AppState>,
    Query(req): Query<AnalyzeRequest>,
) -> Result<Json<ApiReport>, ApiError> {
    let report = state.scanner.analyze_url(&req).await?;
    tracing::info!(
        url = %req.url,
        roi = report.profitability.roi_percentage(),
        "analyzed product"
    );
    Ok(Json(state.remember(report).await))
}

#[derive(Debug, Deserialize)]
struct ProfitableParams {
    min_roi: Option<f64>,
    max_price: Option<f64>,
}

async fn profitable_products(
    State(state): State<AppState>,
    Query(params): Query<ProfitableParams>,
) -> Result<Json<Vec<ApiReport>>, ApiError> {
    let thresholds = state
        .thresholds
        .with_overrides(params.min_roi, params.max_price)?;

    let reports = state.reports.read().await;
    let kept = filter_profitable(reports.iter(), &thresholds)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(kept))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &fba_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use fba_core::ingest::PlaceholderPageFetcher;
    use fba_core::pricing::{ProfitabilityAnalyzer, WeightBasedFeeSchedule};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let scanner = ArbitrageScanner::new(
            Arc::new(PlaceholderPageFetcher),
            None,
            ProfitabilityAnalyzer::new(WeightBasedFeeSchedule::default()),
        );
        router(AppState::new(scanner, FilterThresholds::default()))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let (status, body) = send(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn analyzes_url_with_explicit_price() {
        let (status, body) = send(
            &app(),
            post("/analyze-product?url=https%3A%2F%2Fshop.example%2Fa&marketplace_price=40"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Sample Product");
        assert_eq!(body["source_url"], "https://shop.example/a");
        let roi = body["profitability"]["roi_percentage"].as_f64().unwrap();
        // 19.99 + 2.41 + 0.40 = 22.80
        assert!((roi - (40.0 - 22.8) / 22.8 * 100.0).abs() < 1e-6);
        assert!(body["id"].is_string());
    }

    #[tokio::test]
    async fn url_without_any_price_is_bad_request() {
        let (status, body) = send(
            &app(),
            post("/analyze-product?url=https%3A%2F%2Fshop.example%2Fa"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("marketplace price"));
    }

    #[tokio::test]
    async fn manual_candidate_with_negative_price_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"title": "Widget", "source_price": -1.0, "marketplace_price": 20.0})
                    .to_string(),
            ))
            .unwrap();

        let (status, _) = send(&app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn profitable_products_filters_what_was_analyzed() {
        let app = app();
        for (path, price) in [("a", 40), ("b", 25), ("c", 120)] {
            let uri = format!(
                "/analyze-product?url=https%3A%2F%2Fshop.example%2F{path}&marketplace_price={price}"
            );
            let (status, _) = send(&app, post(&uri)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(&app, get("/profitable-products")).await;
        assert_eq!(status, StatusCode::OK);
        let urls: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["source_url"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(urls, vec!["https://shop.example/a"]);

        let (_, body) = send(&app, get("/profitable-products?min_roi=50&max_price=500")).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }
}
