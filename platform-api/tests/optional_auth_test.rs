mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use platform_api::models::Role;
use tower::ServiceExt;

use common::{access_control, expired_token, optional_app, test_user};

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

#[tokio::test]
async fn anonymous_request_succeeds_without_identity() {
    let (access, _) = access_control(vec![]);

    let response = optional_app(access)
        .oneshot(
            Request::builder()
                .uri("/feed")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("null"));
}

#[tokio::test]
async fn valid_token_yields_a_personalized_response() {
    let user = test_user("u-9", Role::User, vec![], true);
    let (access, tokens) = access_control(vec![user]);
    let token = tokens
        .issue_session_token("u-9", "u-9@example.com")
        .expect("issue token");

    let response = optional_app(access)
        .oneshot(
            Request::builder()
                .uri("/feed")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("u-9"));
}

#[tokio::test]
async fn expired_token_degrades_to_anonymous_instead_of_failing() {
    let user = test_user("u-10", Role::User, vec![], true);
    let (access, _) = access_control(vec![user]);

    let response = optional_app(access)
        .oneshot(
            Request::builder()
                .uri("/feed")
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", expired_token("u-10")),
                )
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("router call");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("null"));
}
