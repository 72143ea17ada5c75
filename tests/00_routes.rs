use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use ks_api::routes::app;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("valid JSON body")
}

#[tokio::test]
async fn root_banner_is_public() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "KS API");
    assert!(body["endpoints"].is_object());
}

#[tokio::test]
async fn health_reports_degraded_without_database() {
    // No pool is initialized in this process, so the health check degrades
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    for uri in ["/api/users", "/api/roles", "/api/functions", "/api/knowledge-bases"] {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {}", uri);
        let body = body_json(response).await;
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn non_bearer_authorization_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_jwt_is_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/users")
                .header("authorization", "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
