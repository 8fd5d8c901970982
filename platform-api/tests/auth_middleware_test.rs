mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use platform_api::models::Role;
use tower::ServiceExt;

use common::{access_control, expired_token, protected_app, test_user};

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

#[tokio::test]
async fn valid_bearer_token_resolves_identity() {
    let user = test_user("u-1", Role::User, vec![], true);
    let (access, tokens) = access_control(vec![user]);
    let token = tokens
        .issue_session_token("u-1", "u-1@example.com")
        .expect("issue token");

    let response = protected_app(access)
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("\"u-1\""));
}

#[tokio::test]
async fn cookie_token_is_accepted_when_header_absent() {
    let user = test_user("u-2", Role::User, vec![], true);
    let (access, tokens) = access_control(vec![user]);
    let token = tokens
        .issue_session_token("u-2", "u-2@example.com")
        .expect("issue token");

    let response = protected_app(access)
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::COOKIE, format!("token={}", token))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn authorization_header_takes_precedence_over_cookie() {
    let user = test_user("u-3", Role::User, vec![], true);
    let (access, tokens) = access_control(vec![user]);
    let good = tokens
        .issue_session_token("u-3", "u-3@example.com")
        .expect("issue token");

    // A garbage header must fail even when the cookie carries a valid token.
    let response = protected_app(access)
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .header(header::COOKIE, format!("token={}", good))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_credential_is_rejected() {
    let (access, _) = access_control(vec![]);

    let response = protected_app(access)
        .oneshot(
            Request::builder()
                .uri("/protected")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_and_unknown_user_return_identical_responses() {
    let user = test_user("u-4", Role::User, vec![], true);
    let (access, tokens) = access_control(vec![user]);

    let expired = protected_app(access.clone())
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", expired_token("u-4")),
                )
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    let ghost_token = tokens
        .issue_session_token("no-such-user", "ghost@example.com")
        .expect("issue token");
    let ghost = protected_app(access)
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::AUTHORIZATION, format!("Bearer {}", ghost_token))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ghost.status(), StatusCode::UNAUTHORIZED);
    // No oracle: the body must not reveal which failure occurred.
    let expired_body = body_string(expired).await;
    let ghost_body = body_string(ghost).await;
    assert_eq!(expired_body, ghost_body);
}

#[tokio::test]
async fn disabled_account_is_rejected_with_generic_response() {
    let mut user = test_user("u-5", Role::Admin, vec![], true);
    user.is_active = false;
    let (access, tokens) = access_control(vec![user]);
    let token = tokens
        .issue_session_token("u-5", "u-5@example.com")
        .expect("issue token");

    let response = protected_app(access)
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_string(response).await;
    assert!(!body.to_lowercase().contains("disabled"));
}
