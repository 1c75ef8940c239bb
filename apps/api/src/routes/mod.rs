pub mod health;

use axum::{
    http::{header, HeaderName, Method, Uri},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::errors::AppError;
use crate::search::handlers;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// Browser clients call the search endpoint directly, so every response allows any
/// origin and the headers those clients send.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/unified-job-search", post(handlers::handle_search))
        .route("/api/v1/jobs/search", post(handlers::handle_search))
        .fallback(not_found)
        .with_state(state)
        .layer(cors_layer())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::search::test_support::{job, FakeAdapter, RecordingListings, UnscoredScorer};
    use crate::search::Aggregator;
    use crate::sources::{SourceAdapter, SourceFamily};

    fn app() -> Router {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(FakeAdapter::with_jobs(
                "usajobs",
                SourceFamily::Usajobs,
                vec![job("usajobs_1", "IT Specialist", "USAJobs.gov")],
            )),
            Arc::new(FakeAdapter::failing("adzuna", SourceFamily::Adzuna)),
        ];
        let aggregator = Aggregator::new(
            adapters,
            Arc::new(UnscoredScorer),
            Arc::new(RecordingListings::default()),
        );
        build_router(AppState {
            aggregator: Arc::new(aggregator),
        })
    }

    fn search(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "jobsearch-api");
    }

    #[tokio::test]
    async fn test_search_returns_jobs_and_source_statuses() {
        let response = app()
            .oneshot(search("/unified-job-search", r#"{"query": "it specialist"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );

        let body = json_body(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["jobs"][0]["source"], "USAJobs.gov");
        assert_eq!(body["sources"]["usajobs"]["status"], "success");
        assert!(body["sources"]["adzuna"]["status"]
            .as_str()
            .unwrap()
            .starts_with("error:"));
        assert_eq!(body["searchParams"]["query"], "it specialist");
        assert!(body["executionTime"].is_u64());
        assert_eq!(body["filterReport"]["date"]["relaxed"], false);
    }

    #[tokio::test]
    async fn test_versioned_path_is_an_alias() {
        let response = app()
            .oneshot(search("/api/v1/jobs/search", r#"{"query": "it"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_blank_query_is_an_error_without_jobs() {
        let response = app()
            .oneshot(search("/unified-job-search", r#"{"query": "  "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["code"], "INVALID_QUERY");
        assert!(body["error"].is_string());
        assert!(body.get("jobs").is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_bad_request() {
        let response = app()
            .oneshot(search("/unified-job-search", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_preflight_allows_client_headers() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/unified-job-search")
            .header("origin", "https://app.example.com")
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "apikey,x-client-info")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let allowed = response.headers()["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .to_string();
        assert!(allowed.contains("apikey"));
        assert!(allowed.contains("x-client-info"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
