//! Signed static QR links.
//!
//! A printed QR code carries an HS256 JWT naming a building and the
//! workshop-day flag. It has no expiry; every scan mints a fresh one-time
//! token.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use survey_core::models::building::BuildingNumber;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("invalid signature or claims")]
    Invalid,

    #[error("jwt encode: {0}")]
    Encode(String),
}

/// Claims of a signed QR link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrClaims {
    pub b: BuildingNumber,
    #[serde(default)]
    pub wd: bool,
    pub iat: i64,
}

/// Sign a QR link for `building`.
pub fn sign_qr(building: BuildingNumber, workshop_day: bool, secret: &[u8]) -> Result<String, SigningError> {
    let claims = QrClaims {
        b: building,
        wd: workshop_day,
        iat: Utc::now().timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| SigningError::Encode(e.to_string()))
}

/// Verify a signed QR link and return its claims.
pub fn verify_qr(token: &str, secret: &[u8]) -> Result<QrClaims, SigningError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    decode::<QrClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|_| SigningError::Invalid)
}
