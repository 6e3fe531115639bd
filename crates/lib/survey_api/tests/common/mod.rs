//! Shared fixtures: test configuration, a fake workflow endpoint and a bound
//! proxy.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use serde_json::Value;
use survey_api::AppState;
use survey_api::config::ApiConfig;
use tokio::net::TcpListener;

pub const ACCESS_KEY: &str = "RacingCampeon-test";
pub const PAGE_URL: &str = "https://kiosk.example/survey/";

pub fn test_config(flow_url: &str, page_url: Option<&str>) -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        access_key: ACCESS_KEY.into(),
        flow_url: flow_url.into(),
        signing_secret: "test-signing-secret".into(),
        page_url: page_url.map(str::to_string),
        public_base_url: "http://proxy.test".into(),
    }
}

#[derive(Clone, Default)]
struct FlowState {
    received: Arc<Mutex<Vec<Value>>>,
    reply: Arc<Mutex<(u16, String)>>,
}

/// Workflow endpoint stand-in that records every body it receives.
pub struct FakeFlow {
    pub url: String,
    state: FlowState,
}

impl FakeFlow {
    pub async fn spawn() -> Self {
        let state = FlowState::default();
        *state.reply.lock().unwrap() = (202, "Accepted".into());

        let app = Router::new()
            .route("/flow", post(flow_handler))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/flow"),
            state,
        }
    }

    pub fn respond_with(&self, status: u16, body: &str) {
        *self.state.reply.lock().unwrap() = (status, body.into());
    }

    pub fn received(&self) -> Vec<Value> {
        self.state.received.lock().unwrap().clone()
    }
}

async fn flow_handler(State(state): State<FlowState>, Json(body): Json<Value>) -> (StatusCode, String) {
    state.received.lock().unwrap().push(body);
    let (status, text) = state.reply.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), text)
}

/// Bind the proxy on an ephemeral port. The public base URL is set to the
/// bound address so signed QR links point back at it.
pub async fn spawn_proxy(mut config: ApiConfig) -> (String, AppState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    config.bind_addr = base.trim_start_matches("http://").to_string();
    config.public_base_url = base.clone();

    let state = AppState::new(config);
    let app = survey_api::router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (base, state)
}
