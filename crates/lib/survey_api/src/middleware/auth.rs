//! Credential checks: the shared access key (`x-api-key`) and one-time
//! tokens (`x-token`).

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use survey_core::transport::{API_KEY_HEADER, TOKEN_HEADER};

use crate::AppState;
use crate::error::AppError;

/// Message returned for unknown, used or expired one-time tokens.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or used token";

/// Who is calling the submission proxy. Inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Holder of the shared access key.
    Supporter,
    /// Holder of a live one-time token (not yet claimed).
    Respondent(String),
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Whether `headers` carry the configured access key. An empty configured
/// key matches nothing.
pub fn has_access_key(headers: &HeaderMap, access_key: &str) -> bool {
    !access_key.is_empty() && header(headers, API_KEY_HEADER) == Some(access_key)
}

/// Axum middleware: requires `x-api-key` to equal the access key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !has_access_key(request.headers(), &state.config.access_key) {
        return Err(AppError::Unauthorized("Unauthorized".into()));
    }
    Ok(next.run(request).await)
}

/// Axum middleware: accepts a live `x-token` or the access key and injects
/// the [`Caller`]. A token header takes precedence over the key.
pub async fn require_credential(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = if let Some(token) = header(request.headers(), TOKEN_HEADER) {
        if !state.tokens.is_live(token) {
            return Err(AppError::Unauthorized(INVALID_TOKEN_MESSAGE.into()));
        }
        Caller::Respondent(token.to_string())
    } else if has_access_key(request.headers(), &state.config.access_key) {
        Caller::Supporter
    } else {
        return Err(AppError::Unauthorized("Unauthorized".into()));
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn access_key_must_match_exactly() {
        let mut headers = HeaderMap::new();
        assert!(!has_access_key(&headers, "secret"));
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("secret "));
        assert!(!has_access_key(&headers, "secret"));
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("secret"));
        assert!(has_access_key(&headers, "secret"));
    }

    #[test]
    fn empty_configured_key_matches_nothing() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static(""));
        assert!(!has_access_key(&headers, ""));
    }
}
