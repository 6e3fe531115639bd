//! Client facade wiring the components over one store, transport and clock.

use std::sync::Arc;

use tracing::info;

use crate::access::AccessCache;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::form::FormControls;
use crate::links::LinkIssuer;
use crate::page::{PageLoad, PageParams, PageState, Screen};
use crate::preferences::Preferences;
use crate::store::{self, SharedStore};
use crate::submit::SurveySubmitter;
use crate::transport::{HttpTransport, Transport};
use crate::verify::TokenVerifier;

/// Entry point for kiosk front ends.
pub struct SurveyClient {
    config: ClientConfig,
    store: SharedStore,
    access: Arc<AccessCache>,
    issuer: LinkIssuer,
    verifier: TokenVerifier,
    submitter: SurveySubmitter,
    preferences: Preferences,
}

impl std::fmt::Debug for SurveyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurveyClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SurveyClient {
    pub fn new(
        config: ClientConfig,
        store: SharedStore,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let access = Arc::new(AccessCache::new(&config, store.clone(), transport.clone(), clock));
        Self {
            issuer: LinkIssuer::new(&config, transport.clone(), access.clone()),
            verifier: TokenVerifier::new(&config, transport.clone()),
            submitter: SurveySubmitter::new(&config, transport, access.clone()),
            preferences: Preferences::new(&config, store.clone()),
            access,
            store,
            config,
        }
    }

    /// Client over HTTP with the system clock.
    pub fn with_http(config: ClientConfig, store: SharedStore) -> Self {
        Self::new(config, store, Arc::new(HttpTransport::new()), Arc::new(SystemClock))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn access(&self) -> &AccessCache {
        &self.access
    }

    pub fn issuer(&self) -> &LinkIssuer {
        &self.issuer
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn submitter(&self) -> &SurveySubmitter {
        &self.submitter
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Clear every persisted key.
    pub fn reset(&self) {
        let keys = &self.config.storage;
        for key in [&keys.auth, &keys.building, &keys.workshop_day, &keys.kiosk] {
            store::remove_best_effort(self.store.as_ref(), key);
        }
        info!("session state reset");
    }

    /// Load the page at `url`: handle `reset=1`, pick the first screen and
    /// verify a one-time token if present.
    pub async fn open_page(&self, url: &str) -> Result<PageLoad, url::ParseError> {
        let params = PageParams::parse(url)?;
        if params.reset {
            self.reset();
            return Ok(PageLoad::Reset {
                next_url: params.cleaned_url(),
            });
        }

        let has_token = params.token.is_some();
        let login_required = !has_token && !self.access.is_authenticated();
        let screen = if has_token {
            Screen::Survey
        } else {
            Screen::BuildingSelection
        };
        let building = self.preferences.selected_building(params.building.as_deref());
        let workshop_default = self.preferences.prefer_workshop_day(params.workshop_day);

        let mut form = FormControls::survey();
        let verification = self
            .verifier
            .verify_form(params.token.as_deref(), &mut form)
            .await;

        Ok(PageLoad::Ready(Box::new(PageState {
            login_required,
            screen,
            building,
            workshop_default,
            kiosk: self.preferences.is_kiosk(),
            verification,
            form,
            params,
        })))
    }
}
