//! HTTP API for the Taiwan stock analyst
//!
//! Routes:
//! - `POST /analyze` with `{"company": "..."}`
//! - `POST /update-list`
//! - `GET /health`

pub mod routes;

use analyst_core::RequestHandler;
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<RequestHandler>,
}

impl AppState {
    pub fn new(handler: RequestHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/analyze", post(routes::analyze))
        .route("/update-list", post(routes::update_list))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::directory::{
        CompanyDirectory, CompanySource, DirectoryHandle, DirectoryStore, ListedCompany,
    };
    use analyst_core::{
        AnalysisPipeline, AnalystError, Bar, CompanyRecord, MarketDataSource, PipelineSettings,
    };
    use analyst_llm::{
        CompletionRequest, CompletionResponse, LLMProvider, Message, StopReason, TokenUsage,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    struct JsonProvider;

    #[async_trait]
    impl LLMProvider for JsonProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> analyst_llm::Result<CompletionResponse> {
            Ok(CompletionResponse {
                message: Message::assistant(r#"{"summary": "穩定"}"#),
                model: request.model,
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "json"
        }
    }

    struct FlatMarket;

    #[async_trait]
    impl MarketDataSource for FlatMarket {
        async fn daily_bars(&self, _ticker: &str, _days: u32) -> analyst_core::Result<Vec<Bar>> {
            Ok((0..20)
                .map(|i| Bar {
                    timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::days(i),
                    open: 100.0,
                    high: 101.0,
                    low: 99.0,
                    close: 100.0 + i as f64,
                    volume: 5000,
                })
                .collect())
        }

        fn name(&self) -> &str {
            "flat"
        }
    }

    struct OfflineSource;

    #[async_trait]
    impl CompanySource for OfflineSource {
        async fn fetch_companies(&self) -> analyst_core::Result<Vec<ListedCompany>> {
            Err(AnalystError::SourceError("offline".to_string()))
        }

        fn name(&self) -> &str {
            "offline"
        }
    }

    fn app(dir: &tempfile::TempDir) -> Router {
        let directory = Arc::new(DirectoryHandle::new(
            CompanyDirectory::from_records(vec![
                CompanyRecord::new("2330.TW", "台積電").with_aliases(["tsmc"]),
            ])
            .unwrap(),
            DirectoryStore::new(dir.path().join("companies.json")),
            Arc::new(OfflineSource),
        ));
        let pipeline = AnalysisPipeline::new(
            Arc::new(FlatMarket),
            Arc::new(JsonProvider),
            PipelineSettings {
                model: "test-model".to_string(),
                max_tokens: 128,
                temperature: 0.0,
                lookback_days: 30,
            },
        )
        .unwrap();

        router(AppState::new(RequestHandler::new(directory, Arc::new(pipeline))))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn analyze_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_ok() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = call(app(&dir), analyze_request(r#"{"company": "台積電"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["company"]["ticker"], "2330.TW");
        assert_eq!(body["market_analysis"]["summary"], "穩定");
    }

    #[tokio::test]
    async fn test_analyze_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) =
            call(app(&dir), analyze_request(r#"{"company": "unknown-co"}"#)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("unknown-co"));
    }

    #[tokio::test]
    async fn test_analyze_bad_body() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = call(app(&dir), analyze_request(r#"{"ticker": 1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, _) = call(app(&dir), analyze_request(r#"{"company": " "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_list_always_200() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/update-list")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app(&dir), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failure");
        assert!(body["message"].as_str().unwrap().contains("offline"));
        assert!(body["output"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = call(app(&dir), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["companies"], 1);
    }
}
