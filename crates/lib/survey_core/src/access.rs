//! Supporter access cache.
//!
//! A supporter unlocks the kiosk by typing the shared access key. The key is
//! checked only by the submission endpoint (a `{ping: true}` probe); once it
//! answers 2xx the key is remembered for the rest of the UTC calendar day as
//! `YYYY-MM-DD|secret`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::{ClientConfig, StorageKeys};
use crate::models::wire::PingRequest;
use crate::store::{self, SharedStore};
use crate::transport::{Credential, OutboundRequest, Transport};

/// The persisted access credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCredential {
    /// Date the key was validated, as stored (not re-parsed).
    pub issued_date: String,
    pub secret: String,
}

impl AccessCredential {
    /// Parse `date|secret`. A value without a `|` has no secret half and is
    /// rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let (date, secret) = raw.split_once('|')?;
        Some(Self {
            issued_date: date.to_string(),
            secret: secret.to_string(),
        })
    }

    /// Serialized form, `date|secret`.
    pub fn encode(&self) -> String {
        format!("{}|{}", self.issued_date, self.secret)
    }

    /// Valid iff issued today (string equality on the ISO date) and the
    /// secret is non-empty.
    pub fn is_valid_on(&self, today_iso: &str) -> bool {
        self.issued_date == today_iso && !self.secret.is_empty()
    }
}

/// Access cache over the injected session store.
pub struct AccessCache {
    store: SharedStore,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    keys: StorageKeys,
    survey_endpoint: String,
}

impl std::fmt::Debug for AccessCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCache")
            .field("survey_endpoint", &self.survey_endpoint)
            .finish_non_exhaustive()
    }
}

impl AccessCache {
    pub fn new(
        config: &ClientConfig,
        store: SharedStore,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            keys: config.storage.clone(),
            survey_endpoint: config.endpoints.survey.clone(),
        }
    }

    /// The stored credential, or `None` when unset, unreadable or malformed.
    pub fn load_credential(&self) -> Option<AccessCredential> {
        store::read_or_none(self.store.as_ref(), &self.keys.auth)
            .as_deref()
            .and_then(AccessCredential::parse)
    }

    /// Whether `credential` is valid today.
    pub fn is_valid(&self, credential: &AccessCredential) -> bool {
        credential.is_valid_on(&self.clock.today_iso())
    }

    /// Whether a credential valid today is stored.
    pub fn is_authenticated(&self) -> bool {
        self.load_credential().is_some_and(|c| self.is_valid(&c))
    }

    /// Probe the submission endpoint with `candidate_key`. On 2xx the key is
    /// stored with today's date and `true` is returned. Network errors and
    /// non-2xx responses both return `false` and store nothing.
    pub async fn attempt_login(&self, candidate_key: &str) -> bool {
        let candidate_key = candidate_key.trim();
        let request = match OutboundRequest::post_json(&self.survey_endpoint, &PingRequest::new()) {
            Ok(r) => r.with_credential(Credential::ApiKey(candidate_key.to_string())),
            Err(e) => {
                debug!("login probe not built: {e}");
                return false;
            }
        };

        let ok = match self.transport.send(request).await {
            Ok(resp) => resp.is_success(),
            Err(e) => {
                debug!("login probe failed: {e}");
                false
            }
        };
        if !ok {
            info!("login rejected");
            return false;
        }

        let credential = AccessCredential {
            issued_date: self.clock.today_iso(),
            secret: candidate_key.to_string(),
        };
        store::write_best_effort(self.store.as_ref(), &self.keys.auth, &credential.encode());
        info!(date = %credential.issued_date, "supporter signed in");
        true
    }

    /// Forget the credential, the selected building and the workshop-day
    /// preference. Never fails.
    pub fn logout(&self) {
        for key in [&self.keys.auth, &self.keys.building, &self.keys.workshop_day] {
            store::remove_best_effort(self.store.as_ref(), key);
        }
        info!("supporter signed out");
    }

    /// The stored secret, or an empty string. Stale (yesterday's) secrets are
    /// still returned; the server decides whether they are accepted.
    pub fn api_key(&self) -> String {
        self.load_credential().map(|c| c.secret).unwrap_or_default()
    }
}
