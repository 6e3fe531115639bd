//! Signed QR links: signing (`sign=1`) and redemption (`q=`).

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header::LOCATION};
use axum::response::{IntoResponse, Response};
use chrono::Duration;
use serde::Deserialize;
use survey_core::links::build_link;
use survey_core::models::building::{BuildingNumber, BuildingTag};
use survey_core::models::wire::SignedQrResponse;
use tracing::info;
use url::Url;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::has_access_key;
use crate::services::signing::{sign_qr, verify_qr};

/// Lifetime of the token minted for each scan.
const SCAN_TOKEN_HOURS: i64 = 24;

/// Route path, also embedded in signed links.
pub const QR_REDIRECT_PATH: &str = "/api/qrRedirect";

/// Query parameters for `GET /api/qrRedirect`.
#[derive(Debug, Default, Deserialize)]
pub struct QrQuery {
    pub sign: Option<String>,
    pub b: Option<String>,
    pub wd: Option<String>,
    pub q: Option<String>,
}

/// `GET /api/qrRedirect`
pub async fn qr_redirect_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<QrQuery>,
) -> AppResult<Response> {
    if query.sign.as_deref() == Some("1") {
        if !has_access_key(&headers, &state.config.access_key) {
            return Err(AppError::Unauthorized("Unauthorized".into()));
        }
        return sign(&state, &query).map(IntoResponse::into_response);
    }
    match query.q.as_deref().filter(|q| !q.is_empty()) {
        Some(q) => redeem(&state, q),
        None => Err(AppError::Validation("Missing q or sign parameter".into())),
    }
}

fn sign(state: &AppState, query: &QrQuery) -> AppResult<Json<SignedQrResponse>> {
    let building = BuildingNumber::parse_qr_input(query.b.as_deref().unwrap_or(""))?;
    let workshop_day = query.wd.as_deref() == Some("1");
    let signed = sign_qr(building, workshop_day, state.config.signing_secret.as_bytes())?;

    let base = format!("{}{QR_REDIRECT_PATH}", state.config.base_url());
    let mut url = Url::parse(&base)
        .map_err(|e| AppError::Internal(format!("public base url {base:?}: {e}")))?;
    url.query_pairs_mut().append_pair("q", &signed);

    info!(building = %building, workshop_day, "signed static QR");
    Ok(Json(SignedQrResponse { url: url.into() }))
}

fn redeem(state: &AppState, q: &str) -> AppResult<Response> {
    let claims = verify_qr(q, state.config.signing_secret.as_bytes())?;
    let page = state
        .config
        .page_url
        .as_deref()
        .ok_or_else(|| AppError::Unavailable("No survey page configured".into()))?;

    let issued = state.tokens.issue(
        Duration::hours(SCAN_TOKEN_HOURS),
        BuildingTag::Building(claims.b),
    );
    let target = build_link(page, &issued.token, Some(claims.b), claims.wd)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!(building = %claims.b, workshop_day = claims.wd, "QR scanned, token minted");
    Ok((StatusCode::FOUND, [(LOCATION, target)]).into_response())
}
