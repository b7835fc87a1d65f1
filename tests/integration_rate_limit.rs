mod common;

use axum::http::{Method, StatusCode};
use common::{json_request, lazy_pool, send, test_state};
use eduzas::eduzas_config::RateLimitConfig;
use eduzas::router::init_router;
use serde_json::json;

fn strict_rate_limit_config() -> RateLimitConfig {
    RateLimitConfig {
        general_per_second: 1,
        general_burst_size: 2,
        auth_per_second: 1,
        auth_burst_size: 1,
    }
}

fn login_request(client: &str) -> axum::http::Request<axum::body::Body> {
    // No password: rejected with 400 before the database is touched.
    let mut request = json_request(
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "someone@test.com"})),
    );
    request
        .headers_mut()
        .insert("x-forwarded-for", client.parse().unwrap());
    request
}

#[tokio::test]
async fn test_auth_rate_limit_exceeded() {
    let app = init_router(test_state(lazy_pool(), strict_rate_limit_config()));

    let (status, _) = send(&app, login_request("192.168.1.100")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, login_request("192.168.1.100")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many requests");
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let app = init_router(test_state(lazy_pool(), strict_rate_limit_config()));

    let (status, _) = send(&app, login_request("192.168.1.1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, login_request("192.168.1.2")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_general_budget_is_separate_from_auth() {
    let app = init_router(test_state(lazy_pool(), strict_rate_limit_config()));

    let (status, _) = send(&app, login_request("10.1.1.1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Same client, non-auth route: burst of 2 still available.
    for _ in 0..2 {
        let (status, _) =
            send(&app, json_request(Method::GET, "/api/users/me", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, _) = send(&app, json_request(Method::GET, "/api/users/me", None, None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_docs_are_not_rate_limited() {
    let app = init_router(test_state(lazy_pool(), strict_rate_limit_config()));

    for _ in 0..5 {
        let (status, _) = send(
            &app,
            json_request(Method::GET, "/api-docs/openapi.json", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
