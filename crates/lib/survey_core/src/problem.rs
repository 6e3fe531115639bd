//! User-facing error taxonomy.
//!
//! Every failure the kiosk shows goes through one dialog: a title, a message
//! and a dismiss action. Server failures are classified by status and by
//! substring heuristics on the lower-cased server message.

use crate::models::survey::Role;
use crate::transport::InboundResponse;

/// Fallback title for failures without a more specific class.
pub const GENERIC_TITLE: &str = "We couldn't submit your response";

/// Fallback message for failures without a more specific class.
pub const GENERIC_MESSAGE: &str = "Please try again in a moment.";

/// What kind of failure is being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    TokenExpiredOrUsed,
    StudentNumberNotFound,
    UsernameNotFound,
    Unauthorized,
    FormNotRecognised,
    ServerUnavailable,
    RateLimited,
    LinkGenerationFailed,
    QrGeneratorUnavailable,
    Network,
    Generic,
}

/// What dismissing the dialog does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dismiss {
    /// Close the dialog and stay on the page ("Try Again").
    TryAgain,
    /// Leave the page for the given URL.
    Redirect(String),
}

impl Dismiss {
    /// Label of the dismiss control.
    pub fn label(&self) -> &'static str {
        match self {
            Dismiss::TryAgain => "Try Again",
            Dismiss::Redirect(_) => "Go to Python Support",
        }
    }
}

/// A classified failure ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub kind: ProblemKind,
    pub title: String,
    pub message: String,
    pub dismiss: Dismiss,
}

/// Context needed to classify a failure.
#[derive(Debug, Clone, Copy)]
pub struct ProblemContext<'a> {
    /// Role currently selected in the form; picks the "not found" wording.
    pub role: Role,
    /// Whether the page was opened through a one-time link.
    pub using_token: bool,
    /// Where an expired one-time link sends the respondent.
    pub support_url: &'a str,
}

impl Problem {
    fn new(kind: ProblemKind, title: &str, message: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            dismiss: Dismiss::TryAgain,
        }
    }

    /// The transport failed before any response arrived.
    pub fn network() -> Self {
        Self::new(
            ProblemKind::Network,
            GENERIC_TITLE,
            "A network error occurred. Please check your connection and try again.",
        )
    }

    /// Classify a failure from the raw message text and HTTP status
    /// (`None` when there was no response).
    pub fn classify(raw: &str, status: Option<u16>, ctx: &ProblemContext<'_>) -> Self {
        let l = raw.to_lowercase();
        let status = status.unwrap_or(0);

        let mut problem = if l.contains("study number does not exist")
            || l.contains("student number does not exist")
        {
            match ctx.role {
                Role::Employee => Self::new(
                    ProblemKind::UsernameNotFound,
                    "DTU username not found",
                    "We couldn't find that DTU username. Please enter your DTU credentials \
                     (letters only, e.g. 'manufer') and try again.",
                ),
                Role::Student => Self::new(
                    ProblemKind::StudentNumberNotFound,
                    "Student number not found",
                    "We couldn't find that student number. Please check the six digits after \
                     's' on your DTU ID (e.g. s123456) and try again.",
                ),
            }
        } else if l.contains("invalid or used token")
            || l.contains("token expired")
            || l.contains("link has expired")
            || (status == 401 && ctx.using_token)
        {
            Self::expired_link()
        } else if l.contains("unauthorized") {
            Self::new(
                ProblemKind::Unauthorized,
                "Not authorised",
                "Your session has expired. Please refresh and try again.",
            )
        } else if l.contains("triggerinputschemamismatch")
            || l.contains("invalid type")
            || l.contains("schema")
        {
            Self::new(
                ProblemKind::FormNotRecognised,
                "Form not recognised",
                "Some information was in the wrong format. Please refresh the page and try again.",
            )
        } else if status >= 500 {
            Self::new(
                ProblemKind::ServerUnavailable,
                "Service temporarily unavailable",
                "We are experiencing a temporary problem. Please try again in a minute.",
            )
        } else if status == 429 {
            Self::new(
                ProblemKind::RateLimited,
                "Too many attempts",
                "Please wait a moment and try again.",
            )
        } else if l.contains("could not generate link") {
            Self::new(
                ProblemKind::LinkGenerationFailed,
                "Could not generate link",
                "Please confirm you are signed in and try again.",
            )
        } else if l.contains("qr generator failed") {
            Self::new(
                ProblemKind::QrGeneratorUnavailable,
                "QR generator unavailable",
                "Network access to the QR service is blocked. Try again or use the copy-link option.",
            )
        } else if !raw.trim().is_empty() {
            Self::new(ProblemKind::Generic, GENERIC_TITLE, &message_of(raw))
        } else {
            Self::new(ProblemKind::Generic, GENERIC_TITLE, GENERIC_MESSAGE)
        };

        if problem.kind == ProblemKind::TokenExpiredOrUsed && ctx.using_token {
            problem.dismiss = Dismiss::Redirect(ctx.support_url.to_string());
        }
        problem
    }

    /// Classify a non-2xx response.
    pub fn from_response(resp: &InboundResponse, ctx: &ProblemContext<'_>) -> Self {
        Self::classify(&server_message(resp), Some(resp.status), ctx)
    }

    fn expired_link() -> Self {
        Self::new(
            ProblemKind::TokenExpiredOrUsed,
            "Oops, this link has expired",
            "This one-time link has already been used or expired. Please request a new link \
             from your supporter.",
        )
    }
}

/// Text to classify from an error response: the JSON `message` field when the
/// body is JSON, otherwise the trimmed body.
pub fn server_message(resp: &InboundResponse) -> String {
    if resp.is_json() {
        match serde_json::from_str::<serde_json::Value>(&resp.body) {
            Ok(serde_json::Value::Object(map)) => match map.get("message") {
                Some(serde_json::Value::String(m)) if !m.is_empty() => m.clone(),
                _ => serde_json::Value::Object(map).to_string(),
            },
            Ok(serde_json::Value::String(s)) => s,
            Ok(other) => other.to_string(),
            Err(_) => resp.body.trim().to_string(),
        }
    } else {
        resp.body.trim().to_string()
    }
}

/// A raw text that may itself be a JSON object with a `message` field.
fn message_of(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => match map.get("message") {
            Some(serde_json::Value::String(m)) => m.clone(),
            _ => raw.to_string(),
        },
        _ => raw.to_string(),
    }
}
