//! Submission proxy handler — forwards survey submissions to the workflow
//! endpoint.
//!
//! `POST /api/surveyProxy`:
//! 1. The caller is authenticated by middleware (access key or live token)
//! 2. `{ping: true}` answers `200 {"ok": true}` without forwarding
//! 3. A one-time token is claimed before forwarding
//! 4. The body is posted as JSON to the workflow URL and the upstream status
//!    and body text are relayed
//! 5. The token is restored when the upstream is unreachable or answers 5xx

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header::CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{Caller, INVALID_TOKEN_MESSAGE};

/// Parse the request body. An empty body is `{}`.
fn parse_body(body: &Bytes) -> AppResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))
}

fn is_ping(body: &Value) -> bool {
    body.get("ping").and_then(Value::as_bool) == Some(true)
}

/// `POST /api/surveyProxy`
pub async fn survey_proxy_handler(
    State(state): State<AppState>,
    axum::Extension(caller): axum::Extension<Caller>,
    body: Bytes,
) -> AppResult<Response> {
    let body = parse_body(&body)?;
    if is_ping(&body) {
        return Ok(Json(json!({ "ok": true })).into_response());
    }

    if state.config.flow_url.is_empty() {
        return Err(AppError::Unavailable("Submission workflow is not configured".into()));
    }

    let claimed = match &caller {
        Caller::Respondent(token) => Some(
            state
                .tokens
                .claim(token)
                .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN_MESSAGE.into()))?,
        ),
        Caller::Supporter => None,
    };

    let upstream = match state.http.post(&state.config.flow_url).json(&body).send().await {
        Ok(resp) => resp,
        Err(e) => {
            if let Some(claimed) = claimed {
                state.tokens.restore(claimed);
            }
            warn!("workflow unreachable: {e}");
            return Err(AppError::Upstream("Could not reach the submission workflow".into()));
        }
    };

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = upstream.text().await.unwrap_or_default();

    match claimed {
        Some(claimed) if status.is_server_error() => {
            warn!(status = status.as_u16(), "workflow failed, token restored");
            state.tokens.restore(claimed);
        }
        Some(claimed) => {
            info!(status = status.as_u16(), building = %claimed.building(), "one-time token consumed");
        }
        None => info!(status = status.as_u16(), "submission forwarded"),
    }

    let mut response = (status, text).into_response();
    if let Some(ct) = content_type.and_then(|ct| ct.parse().ok()) {
        response.headers_mut().insert(CONTENT_TYPE, ct);
    }
    Ok(response)
}
