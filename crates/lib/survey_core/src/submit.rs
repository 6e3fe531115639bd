//! Survey submission.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::access::AccessCache;
use crate::config::{ClientConfig, Timing};
use crate::models::building::BuildingNumber;
use crate::models::survey::{SurveyError, SurveyForm};
use crate::problem::{Problem, ProblemContext};
use crate::transport::{Credential, OutboundRequest, Transport};

/// Submission failures. Each carries the problem to show.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(#[from] SurveyError),

    #[error("{}", .0.message)]
    Network(Problem),

    #[error("{}: {}", .problem.title, .problem.message)]
    Rejected { status: u16, problem: Problem },
}

impl SubmitError {
    /// The problem dialog for this failure, if it is shown in one.
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            SubmitError::Invalid(_) => None,
            SubmitError::Network(p) | SubmitError::Rejected { problem: p, .. } => Some(p),
        }
    }
}

/// What the page does after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterSubmit {
    /// One-time link respondent: show thanks, then leave for `url`.
    Redirect { url: String, after: Duration },
    /// Kiosk/supporter flow: show thanks, then reset the form for the next
    /// respondent.
    ResetForm { after: Duration },
}

/// Sends completed surveys to the submission endpoint.
pub struct SurveySubmitter {
    transport: Arc<dyn Transport>,
    access: Arc<AccessCache>,
    survey_endpoint: String,
    support_url: String,
    timing: Timing,
}

impl std::fmt::Debug for SurveySubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurveySubmitter")
            .field("survey_endpoint", &self.survey_endpoint)
            .finish_non_exhaustive()
    }
}

impl SurveySubmitter {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>, access: Arc<AccessCache>) -> Self {
        Self {
            transport,
            access,
            survey_endpoint: config.endpoints.survey.clone(),
            support_url: config.support_url.clone(),
            timing: config.timing,
        }
    }

    /// Submit `form`. With a one-time `token` the request carries `x-token`
    /// only; otherwise it carries the cached key as `x-api-key` only.
    pub async fn submit(
        &self,
        form: &SurveyForm,
        building: Option<BuildingNumber>,
        token: Option<&str>,
    ) -> Result<AfterSubmit, SubmitError> {
        let token = token.filter(|t| !t.is_empty());
        let payload = form.to_payload(building, token)?;

        let credential = match token {
            Some(t) => Credential::Token(t.to_string()),
            None => Credential::ApiKey(self.access.api_key()),
        };
        let request = OutboundRequest::post_json(&self.survey_endpoint, &payload)
            .map_err(|e| {
                warn!("submission not built: {e}");
                SubmitError::Network(Problem::network())
            })?
            .with_credential(credential);

        let ctx = ProblemContext {
            role: form.role,
            using_token: token.is_some(),
            support_url: &self.support_url,
        };

        let resp = match self.transport.send(request).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("submission failed: {e}");
                return Err(SubmitError::Network(Problem::network()));
            }
        };

        if !resp.is_success() {
            let problem = Problem::from_response(&resp, &ctx);
            warn!(status = resp.status, kind = ?problem.kind, "submission rejected");
            return Err(SubmitError::Rejected {
                status: resp.status,
                problem,
            });
        }

        info!(role = %form.role, building = ?building.map(BuildingNumber::get), "survey submitted");
        Ok(match token {
            Some(_) => AfterSubmit::Redirect {
                url: self.support_url.clone(),
                after: self.timing.redirect_delay,
            },
            None => AfterSubmit::ResetForm {
                after: self.timing.thank_you_display,
            },
        })
    }
}
