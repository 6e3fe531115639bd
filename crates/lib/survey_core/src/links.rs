//! One-time link and signed QR issuance.
//!
//! Both operations are supporter-privileged: they send the cached access key
//! as `x-api-key`. Whether that key is still accepted is decided by the
//! issuing endpoint, not here; callers gate the controls on
//! [`crate::access::AccessCache::is_authenticated`].

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::access::AccessCache;
use crate::config::ClientConfig;
use crate::models::building::{BuildingError, BuildingNumber, BuildingTag};
use crate::models::wire::{
    DEFAULT_EXPIRES_HOURS, IssueTokenRequest, IssueTokenResponse, SignedQrResponse,
};
use crate::problem::server_message;
use crate::transport::{Credential, OutboundRequest, Transport, TransportError};

/// Query parameter carrying a one-time token in built links.
pub const TOKEN_PARAM: &str = "t";

/// Issuance failures.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{0}")]
    InvalidBuilding(#[from] BuildingError),

    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// The issuer answered non-2xx; `detail` is the server-provided text.
    #[error("{prefix} {detail}")]
    Rejected {
        prefix: &'static str,
        status: u16,
        detail: String,
    },

    #[error("Unexpected issuer response: {0}")]
    InvalidResponse(String),
}

impl LinkError {
    /// HTTP status of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            LinkError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A shareable one-time link, tagged by where its URL came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedLink {
    /// The issuer returned a ready `url`.
    ServerUrl(String),
    /// The issuer returned a ready `oneTimeUrl`.
    OneTimeUrl(String),
    /// The issuer returned only a token; the URL was built on the page URL.
    Constructed { token: String, url: String },
}

impl IssuedLink {
    /// Resolve an issuer response once, preferring `url`, then `oneTimeUrl`,
    /// then a URL built from `token`. A ready URL gets `wd=1` appended when
    /// the workshop-day flag is set and the issuer left it out.
    pub fn from_response(
        response: IssueTokenResponse,
        page_url: &str,
        building: Option<BuildingNumber>,
        workshop_day: bool,
    ) -> Result<Self, LinkError> {
        if let Some(url) = response.url.filter(|u| !u.is_empty()) {
            return Ok(Self::ServerUrl(mark_workshop_day(url, workshop_day)));
        }
        if let Some(url) = response.one_time_url.filter(|u| !u.is_empty()) {
            return Ok(Self::OneTimeUrl(mark_workshop_day(url, workshop_day)));
        }
        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LinkError::InvalidResponse("neither url nor token present".into()))?;
        let url = build_link(page_url, &token, building, workshop_day)?;
        Ok(Self::Constructed { token, url })
    }

    /// The shareable URL.
    pub fn url(&self) -> &str {
        match self {
            Self::ServerUrl(url) | Self::OneTimeUrl(url) => url,
            Self::Constructed { url, .. } => url,
        }
    }
}

/// Append `wd=1` unless already present. Unparseable URLs pass through.
fn mark_workshop_day(raw: String, workshop_day: bool) -> String {
    if !workshop_day {
        return raw;
    }
    let Ok(mut url) = Url::parse(&raw) else {
        return raw;
    };
    if url.query_pairs().any(|(k, _)| k == "wd") {
        return raw;
    }
    url.query_pairs_mut().append_pair("wd", "1");
    url.into()
}

/// `page_url` (query and fragment dropped) + `?t=<token>[&b=<b>][&wd=1]`.
pub fn build_link(
    page_url: &str,
    token: &str,
    building: Option<BuildingNumber>,
    workshop_day: bool,
) -> Result<String, LinkError> {
    let mut url = Url::parse(page_url)
        .map_err(|e| LinkError::InvalidResponse(format!("page url {page_url:?}: {e}")))?;
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair(TOKEN_PARAM, token);
        if let Some(b) = building {
            pairs.append_pair("b", &b.to_string());
        }
        if workshop_day {
            pairs.append_pair("wd", "1");
        }
    }
    Ok(url.into())
}

/// Issues one-time links and signed QR links.
pub struct LinkIssuer {
    transport: Arc<dyn Transport>,
    access: Arc<AccessCache>,
    token_endpoint: String,
    qr_endpoint: String,
    page_url: String,
}

impl std::fmt::Debug for LinkIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkIssuer")
            .field("token_endpoint", &self.token_endpoint)
            .field("qr_endpoint", &self.qr_endpoint)
            .finish_non_exhaustive()
    }
}

impl LinkIssuer {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>, access: Arc<AccessCache>) -> Self {
        Self {
            transport,
            access,
            token_endpoint: config.endpoints.token.clone(),
            qr_endpoint: config.endpoints.qr_sign.clone(),
            page_url: config.page_url.clone(),
        }
    }

    /// Request a fresh one-time token for the selected building (or
    /// `"Online"`) and turn it into a shareable link. Every call issues a new
    /// token.
    pub async fn issue_one_time_link(
        &self,
        building: Option<BuildingNumber>,
        workshop_day: bool,
    ) -> Result<IssuedLink, LinkError> {
        let body = IssueTokenRequest {
            expires_hours: DEFAULT_EXPIRES_HOURS,
            building_number: BuildingTag::from_selection(building),
        };
        let request = OutboundRequest::post_json(&self.token_endpoint, &body)?
            .with_credential(Credential::ApiKey(self.access.api_key()));

        let resp = self.transport.send(request).await?;
        if !resp.is_success() {
            warn!(status = resp.status, "one-time link rejected");
            return Err(LinkError::Rejected {
                prefix: "Could not generate link.",
                status: resp.status,
                detail: resp.body.trim().to_string(),
            });
        }

        // An unreadable body counts as an empty one.
        let data: IssueTokenResponse = resp.json().unwrap_or_default();
        let link = IssuedLink::from_response(data, &self.page_url, building, workshop_day)?;
        info!(building = %body.building_number, "one-time link issued");
        Ok(link)
    }

    /// Ask the issuer for a durable signed URL for printing. The building
    /// input is validated (`0..=990`) before anything is sent.
    pub async fn issue_signed_qr(
        &self,
        building_input: &str,
        workshop_day: bool,
    ) -> Result<String, LinkError> {
        let building = BuildingNumber::parse_qr_input(building_input)?;
        self.issue_signed_qr_for(building, workshop_day).await
    }

    /// Signed URL for an already validated building.
    pub async fn issue_signed_qr_for(
        &self,
        building: BuildingNumber,
        workshop_day: bool,
    ) -> Result<String, LinkError> {
        let query = vec![
            ("sign".to_string(), "1".to_string()),
            ("b".to_string(), building.to_string()),
            ("wd".to_string(), if workshop_day { "1" } else { "0" }.to_string()),
        ];
        let request = OutboundRequest::get(&self.qr_endpoint, query)
            .with_credential(Credential::ApiKey(self.access.api_key()));

        let resp = self.transport.send(request).await?;
        if !resp.is_success() {
            warn!(status = resp.status, "signed QR rejected");
            return Err(LinkError::Rejected {
                prefix: "Could not create static QR.",
                status: resp.status,
                detail: server_message(&resp),
            });
        }

        let data: SignedQrResponse = resp
            .json()
            .map_err(|e| LinkError::InvalidResponse(format!("signed QR body: {e}")))?;
        info!(building = %building, workshop_day, "signed QR issued");
        Ok(data.url)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::clock::FixedClock;
    use crate::store::{MemoryStore, SessionStore, SharedStore};
    use crate::transport::testing::{FakeTransport, Reply};
    use crate::transport::{API_KEY_HEADER, Method};

    fn issuer(transport: Arc<FakeTransport>, stored_auth: Option<&str>) -> LinkIssuer {
        let config = ClientConfig::for_proxy("http://proxy", "https://kiosk.example/survey/?x=1#top");
        let store: SharedStore = Arc::new(MemoryStore::new());
        if let Some(raw) = stored_auth {
            store.set(&config.storage.auth, raw).unwrap();
        }
        let clock = Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()));
        let access = Arc::new(AccessCache::new(&config, store, transport.clone(), clock));
        LinkIssuer::new(&config, transport, access)
    }

    fn b(n: u16) -> BuildingNumber {
        BuildingNumber::new(n).unwrap()
    }

    #[test]
    fn build_link_drops_old_query_and_appends_params() {
        let url = build_link("https://kiosk.example/survey/?reset=1#x", "a b", Some(b(303)), true)
            .unwrap();
        assert_eq!(url, "https://kiosk.example/survey/?t=a+b&b=303&wd=1");
    }

    #[test]
    fn response_variants_resolve_in_order() {
        let both = IssueTokenResponse {
            token: Some("tok".into()),
            url: Some("https://srv/u".into()),
            one_time_url: Some("https://srv/o".into()),
            expires_at: None,
        };
        assert_eq!(
            IssuedLink::from_response(both, "https://k/", None, false).unwrap(),
            IssuedLink::ServerUrl("https://srv/u".into())
        );

        let one_time = IssueTokenResponse {
            one_time_url: Some("https://srv/o".into()),
            ..Default::default()
        };
        assert_eq!(
            IssuedLink::from_response(one_time, "https://k/", None, false).unwrap(),
            IssuedLink::OneTimeUrl("https://srv/o".into())
        );

        let token_only = IssueTokenResponse {
            token: Some("tok".into()),
            ..Default::default()
        };
        assert_eq!(
            IssuedLink::from_response(token_only, "https://k/", None, false).unwrap(),
            IssuedLink::Constructed {
                token: "tok".into(),
                url: "https://k/?t=tok".into()
            }
        );

        let server_url = IssueTokenResponse {
            url: Some("https://k/?t=tok&b=303".into()),
            ..Default::default()
        };
        assert_eq!(
            IssuedLink::from_response(server_url, "https://k/", None, true).unwrap(),
            IssuedLink::ServerUrl("https://k/?t=tok&b=303&wd=1".into())
        );

        let already_marked = IssueTokenResponse {
            one_time_url: Some("https://k/?t=tok&wd=1".into()),
            ..Default::default()
        };
        assert_eq!(
            IssuedLink::from_response(already_marked, "https://k/", None, true).unwrap(),
            IssuedLink::OneTimeUrl("https://k/?t=tok&wd=1".into())
        );

        assert!(matches!(
            IssuedLink::from_response(IssueTokenResponse::default(), "https://k/", None, false),
            Err(LinkError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn one_time_link_sends_online_when_no_building() {
        let transport = Arc::new(FakeTransport::replying([Reply::Json(
            200,
            serde_json::json!({"token": "tok-1"}),
        )]));
        let issuer = issuer(transport.clone(), Some("2026-10-16|key"));

        let link = issuer.issue_one_time_link(None, true).await.unwrap();
        assert_eq!(link.url(), "https://kiosk.example/survey/?t=tok-1&wd=1");

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].url, "http://proxy/api/issueToken");
        assert_eq!(
            sent[0].body,
            Some(serde_json::json!({"expiresHours": 24, "building_Number": "Online"}))
        );
        assert_eq!(
            sent[0].credential.as_ref().map(|c| c.header()),
            Some((API_KEY_HEADER, "key"))
        );
    }

    #[tokio::test]
    async fn each_call_issues_a_new_link() {
        let transport = Arc::new(FakeTransport::replying([
            Reply::Json(200, serde_json::json!({"token": "one"})),
            Reply::Json(200, serde_json::json!({"token": "two"})),
        ]));
        let issuer = issuer(transport.clone(), Some("2026-10-16|key"));
        let first = issuer.issue_one_time_link(Some(b(101)), false).await.unwrap();
        let second = issuer.issue_one_time_link(Some(b(101)), false).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn rejection_carries_server_detail() {
        let transport = Arc::new(FakeTransport::replying([Reply::Status(
            401,
            "Unauthorized".into(),
        )]));
        // No stored key: the request still goes out with an empty key and the
        // server is the one refusing it.
        let issuer = issuer(transport.clone(), None);

        let err = issuer.issue_one_time_link(None, false).await.unwrap_err();
        assert_eq!(err.to_string(), "Could not generate link. Unauthorized");
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            transport.sent()[0].credential.as_ref().map(|c| c.header()),
            Some((API_KEY_HEADER, ""))
        );
    }

    #[tokio::test]
    async fn signed_qr_rejects_out_of_range_without_network() {
        let transport = Arc::new(FakeTransport::default());
        let issuer = issuer(transport.clone(), Some("2026-10-16|key"));

        for bad in ["991", "-1", "", "abc"] {
            let err = issuer.issue_signed_qr(bad, false).await.unwrap_err();
            assert!(matches!(err, LinkError::InvalidBuilding(BuildingError::OutOfQrRange)));
        }
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn signed_qr_sends_get_with_flags() {
        let transport = Arc::new(FakeTransport::replying([Reply::Json(
            200,
            serde_json::json!({"url": "https://proxy/api/qrRedirect?q=abc"}),
        )]));
        let issuer = issuer(transport.clone(), Some("2026-10-16|key"));

        let url = issuer.issue_signed_qr("101", true).await.unwrap();
        assert_eq!(url, "https://proxy/api/qrRedirect?q=abc");

        let sent = transport.sent();
        assert_eq!(sent[0].method, Method::Get);
        assert_eq!(sent[0].query_param("sign"), Some("1"));
        assert_eq!(sent[0].query_param("b"), Some("101"));
        assert_eq!(sent[0].query_param("wd"), Some("1"));
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn signed_qr_network_error_propagates() {
        let transport = Arc::new(FakeTransport::replying([Reply::NetworkError]));
        let issuer = issuer(transport, Some("2026-10-16|key"));
        assert!(matches!(
            issuer.issue_signed_qr("0", false).await,
            Err(LinkError::Network(_))
        ));
    }
}
