//! Router tests: credentials, token issuance, forwarding and QR signing.

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use serde_json::{Value, json};
use survey_api::AppState;
use survey_core::models::building::{BuildingNumber, BuildingTag};
use tower::ServiceExt;

use common::{ACCESS_KEY, FakeFlow, PAGE_URL, test_config};

fn app(state: &AppState) -> Router {
    survey_api::router(state.clone())
}

fn post_json(uri: &str, credential: Option<(&str, &str)>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some((name, value)) = credential {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse JSON")
}

fn survey_body(token: Option<&str>) -> Value {
    json!({
        "role": "student",
        "student_number": "s123456",
        "username": null,
        "satisfaction": 4,
        "course_number": null,
        "building_Number": 303,
        "workshop": false,
        "token": token,
    })
}

fn issue(state: &AppState) -> String {
    state
        .tokens
        .issue(
            Duration::hours(24),
            BuildingTag::Building(BuildingNumber::new(303).unwrap()),
        )
        .token
}

#[tokio::test]
async fn ping_with_access_key_is_ok() {
    let state = AppState::new(test_config("", None));
    let resp = app(&state)
        .oneshot(post_json(
            "/api/surveyProxy",
            Some(("x-api-key", ACCESS_KEY)),
            json!({"ping": true}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"ok": true}));
}

#[tokio::test]
async fn missing_or_wrong_key_is_unauthorized() {
    let state = AppState::new(test_config("", None));
    for credential in [None, Some(("x-api-key", "wrong"))] {
        let resp = app(&state)
            .oneshot(post_json("/api/surveyProxy", credential, json!({"ping": true})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "unauthorized");
    }
}

#[tokio::test]
async fn unknown_token_is_rejected_with_used_token_message() {
    let state = AppState::new(test_config("", None));
    let resp = app(&state)
        .oneshot(post_json(
            "/api/surveyProxy",
            Some(("x-token", "never-issued")),
            json!({"ping": true}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Invalid or used token");
}

#[tokio::test]
async fn token_ping_does_not_consume() {
    let state = AppState::new(test_config("", None));
    let token = issue(&state);
    for _ in 0..2 {
        let resp = app(&state)
            .oneshot(post_json(
                "/api/surveyProxy",
                Some(("x-token", &token)),
                json!({"ping": true}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert!(state.tokens.is_live(&token));
}

#[tokio::test]
async fn issue_token_requires_key_and_validates() {
    let state = AppState::new(test_config("", Some(PAGE_URL)));

    let resp = app(&state)
        .oneshot(post_json(
            "/api/issueToken",
            None,
            json!({"expiresHours": 24, "building_Number": 303}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    for hours in [0, 721] {
        let resp = app(&state)
            .oneshot(post_json(
                "/api/issueToken",
                Some(("x-api-key", ACCESS_KEY)),
                json!({"expiresHours": hours, "building_Number": 303}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "hours={hours}");
    }

    let resp = app(&state)
        .oneshot(post_json(
            "/api/issueToken",
            Some(("x-api-key", ACCESS_KEY)),
            json!({"expiresHours": 24, "building_Number": 991}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "validation_error");
    assert!(state.tokens.is_empty());
}

#[tokio::test]
async fn malformed_issue_token_body_gets_json_error() {
    let state = AppState::new(test_config("", Some(PAGE_URL)));
    let request = Request::builder()
        .method("POST")
        .uri("/api/issueToken")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-api-key", ACCESS_KEY)
        .body(Body::from("{not json"))
        .unwrap();

    let resp = app(&state).oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "validation_error");
    assert!(json["message"].as_str().unwrap().starts_with("Invalid issueToken body"));
    assert!(state.tokens.is_empty());
}

#[tokio::test]
async fn issued_token_comes_with_link() {
    let state = AppState::new(test_config("", Some(PAGE_URL)));
    let resp = app(&state)
        .oneshot(post_json(
            "/api/issueToken",
            Some(("x-api-key", ACCESS_KEY)),
            json!({"expiresHours": 24, "building_Number": "Online"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    let token = json["token"].as_str().unwrap();
    assert_eq!(token.len(), 64);
    assert_eq!(json["url"], format!("{PAGE_URL}?t={token}"));
    assert!(json["expiresAt"].is_string());
    assert!(state.tokens.is_live(token));
}

#[tokio::test]
async fn supporter_submission_is_forwarded_and_relayed() {
    let flow = FakeFlow::spawn().await;
    let state = AppState::new(test_config(&flow.url, None));

    let resp = app(&state)
        .oneshot(post_json(
            "/api/surveyProxy",
            Some(("x-api-key", ACCESS_KEY)),
            survey_body(None),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Accepted");
    assert_eq!(flow.received(), vec![survey_body(None)]);
}

#[tokio::test]
async fn token_submission_is_single_use() {
    let flow = FakeFlow::spawn().await;
    let state = AppState::new(test_config(&flow.url, None));
    let token = issue(&state);

    let first = app(&state)
        .oneshot(post_json(
            "/api/surveyProxy",
            Some(("x-token", &token)),
            survey_body(Some(&token)),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = app(&state)
        .oneshot(post_json(
            "/api/surveyProxy",
            Some(("x-token", &token)),
            survey_body(Some(&token)),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(flow.received().len(), 1);
}

#[tokio::test]
async fn upstream_rejection_still_consumes_token() {
    let flow = FakeFlow::spawn().await;
    flow.respond_with(400, "Student number does not exist");
    let state = AppState::new(test_config(&flow.url, None));
    let token = issue(&state);

    let resp = app(&state)
        .oneshot(post_json(
            "/api/surveyProxy",
            Some(("x-token", &token)),
            survey_body(Some(&token)),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(!state.tokens.is_live(&token));
}

#[tokio::test]
async fn upstream_failure_restores_token() {
    let flow = FakeFlow::spawn().await;
    flow.respond_with(503, "busy");
    let state = AppState::new(test_config(&flow.url, None));
    let token = issue(&state);

    let resp = app(&state)
        .oneshot(post_json(
            "/api/surveyProxy",
            Some(("x-token", &token)),
            survey_body(Some(&token)),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(state.tokens.is_live(&token));
}

#[tokio::test]
async fn unreachable_upstream_restores_token() {
    let state = AppState::new(test_config("http://127.0.0.1:1/flow", None));
    let token = issue(&state);

    let resp = app(&state)
        .oneshot(post_json(
            "/api/surveyProxy",
            Some(("x-token", &token)),
            survey_body(Some(&token)),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(resp).await["error"], "upstream_unavailable");
    assert!(state.tokens.is_live(&token));
}

#[tokio::test]
async fn unconfigured_workflow_is_unavailable() {
    let state = AppState::new(test_config("", None));
    let resp = app(&state)
        .oneshot(post_json(
            "/api/surveyProxy",
            Some(("x-api-key", ACCESS_KEY)),
            survey_body(None),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

fn get(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn qr_signing_requires_key_and_valid_building() {
    let state = AppState::new(test_config("", Some(PAGE_URL)));

    let resp = app(&state)
        .oneshot(get("/api/qrRedirect?sign=1&b=101&wd=1", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    for b in ["991", "-1", "abc", ""] {
        let resp = app(&state)
            .oneshot(get(&format!("/api/qrRedirect?sign=1&b={b}"), Some(ACCESS_KEY)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "b={b:?}");
    }
}

#[tokio::test]
async fn signed_qr_redirects_with_fresh_token() {
    let state = AppState::new(test_config("", Some(PAGE_URL)));

    let resp = app(&state)
        .oneshot(get("/api/qrRedirect?sign=1&b=101&wd=1", Some(ACCESS_KEY)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let signed = body_json(resp).await["url"].as_str().unwrap().to_string();
    assert!(signed.starts_with("http://proxy.test/api/qrRedirect?q="));

    let path = signed.trim_start_matches("http://proxy.test");
    let mut minted = Vec::new();
    for _ in 0..2 {
        let resp = app(&state).oneshot(get(path, None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        let location = resp.headers()[header::LOCATION].to_str().unwrap().to_string();
        let url = url::Url::parse(&location).unwrap();
        assert!(location.starts_with(PAGE_URL));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0].0, "t");
        assert_eq!(pairs[1], ("b".into(), "101".into()));
        assert_eq!(pairs[2], ("wd".into(), "1".into()));
        assert!(state.tokens.is_live(&pairs[0].1));
        minted.push(pairs[0].1.clone());
    }
    assert_ne!(minted[0], minted[1]);
}

#[tokio::test]
async fn tampered_qr_is_rejected() {
    let state = AppState::new(test_config("", Some(PAGE_URL)));
    let resp = app(&state)
        .oneshot(get("/api/qrRedirect?q=not.a.jwt", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app(&state).oneshot(get("/api/qrRedirect", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(state.tokens.is_empty());
}
