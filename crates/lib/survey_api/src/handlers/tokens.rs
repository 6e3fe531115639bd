//! One-time token issuance.

use std::ops::RangeInclusive;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use chrono::Duration;
use survey_core::links::build_link;
use survey_core::models::wire::{IssueTokenRequest, IssueTokenResponse};
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Accepted `expiresHours` values.
pub const EXPIRES_HOURS_RANGE: RangeInclusive<u32> = 1..=720;

/// Malformed bodies and out-of-range buildings are validation errors.
fn parse_request(body: &Bytes) -> AppResult<IssueTokenRequest> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid issueToken body: {e}")))
}

/// `POST /api/issueToken` — mint a one-time token for a building.
pub async fn issue_token_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<IssueTokenResponse>> {
    let req = parse_request(&body)?;
    if !EXPIRES_HOURS_RANGE.contains(&req.expires_hours) {
        return Err(AppError::Validation(format!(
            "expiresHours must be between {} and {}",
            EXPIRES_HOURS_RANGE.start(),
            EXPIRES_HOURS_RANGE.end()
        )));
    }

    let issued = state
        .tokens
        .issue(Duration::hours(i64::from(req.expires_hours)), req.building_number);

    let url = state
        .config
        .page_url
        .as_deref()
        .map(|page| build_link(page, &issued.token, issued.building.building(), false))
        .transpose()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!(
        building = %issued.building,
        hours = req.expires_hours,
        "issued one-time token"
    );

    Ok(Json(IssueTokenResponse {
        token: Some(issued.token),
        url,
        one_time_url: None,
        expires_at: Some(issued.expires_at.to_rfc3339()),
    }))
}
