//! One-time link verification on page load.
//!
//! A page opened with `t`/`token` pings the submission endpoint with the
//! token as `x-token` before the respondent can submit. The ping does not
//! consume the token. Outcomes:
//!
//! - no token: the form stays enabled, the building flow applies;
//! - 2xx: verified, the form stays enabled;
//! - any non-2xx (401 included): rejected, every control but the error
//!   dismiss control is disabled and the expired-link problem is shown;
//! - no response at all (network failure): treated as verified.
//!
//! Network failures fail open, HTTP failures fail closed.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::form::{CLOSE_ERROR_CONTROL, FormControls};
use crate::models::survey::Role;
use crate::models::wire::PingRequest;
use crate::problem::{Problem, ProblemContext};
use crate::transport::{Credential, OutboundRequest, Transport};

/// Message used when the server refuses a one-time link.
pub const EXPIRED_LINK_MESSAGE: &str =
    "Oops, this link has expired. Please request a new one-time link from your supporter.";

/// Result of verifying a page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// No token on the page; nothing to verify.
    NoToken,
    /// The server accepted the token.
    Verified,
    /// The ping failed at the network level; the form is left usable.
    VerifiedOffline,
    /// The server refused the token.
    Rejected { status: u16, problem: Problem },
}

impl Verification {
    /// Whether the form may be submitted.
    pub fn allows_submission(&self) -> bool {
        !matches!(self, Verification::Rejected { .. })
    }

    /// Reflect the outcome on the form controls.
    pub fn apply_to(&self, form: &mut FormControls) {
        if let Verification::Rejected { .. } = self {
            form.disable_all_except(CLOSE_ERROR_CONTROL);
        }
    }
}

/// Verifies one-time tokens against the submission endpoint.
pub struct TokenVerifier {
    transport: Arc<dyn Transport>,
    survey_endpoint: String,
    support_url: String,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("survey_endpoint", &self.survey_endpoint)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            survey_endpoint: config.endpoints.survey.clone(),
            support_url: config.support_url.clone(),
        }
    }

    /// Verify `token` (if any).
    pub async fn verify(&self, token: Option<&str>) -> Verification {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Verification::NoToken;
        };

        let request = match OutboundRequest::post_json(&self.survey_endpoint, &PingRequest::new()) {
            Ok(r) => r.with_credential(Credential::Token(token.to_string())),
            Err(e) => {
                warn!("token ping not built: {e}");
                return Verification::VerifiedOffline;
            }
        };

        match self.transport.send(request).await {
            Ok(resp) if resp.is_success() => {
                info!("one-time link verified");
                Verification::Verified
            }
            Ok(resp) => {
                info!(status = resp.status, "one-time link rejected");
                let ctx = ProblemContext {
                    role: Role::Student,
                    using_token: true,
                    support_url: &self.support_url,
                };
                Verification::Rejected {
                    status: resp.status,
                    problem: Problem::classify(EXPIRED_LINK_MESSAGE, Some(resp.status), &ctx),
                }
            }
            Err(e) => {
                warn!("one-time link ping failed, allowing the form: {e}");
                Verification::VerifiedOffline
            }
        }
    }

    /// Verify and apply the outcome to `form` in one step.
    pub async fn verify_form(&self, token: Option<&str>, form: &mut FormControls) -> Verification {
        let outcome = self.verify(token).await;
        outcome.apply_to(form);
        outcome
    }
}
