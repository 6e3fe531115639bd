//! Client configuration: endpoints, storage keys and timings.

use std::time::Duration;

/// Default submission endpoint (also answers `{ping: true}` probes).
pub const DEFAULT_SURVEY_ENDPOINT: &str =
    "https://python-support-proxy.azurewebsites.net/api/surveyProxy";

/// Default one-time token issuing endpoint.
pub const DEFAULT_TOKEN_ENDPOINT: &str =
    "https://python-support-proxy.azurewebsites.net/api/issueToken";

/// Default signed QR endpoint.
pub const DEFAULT_QR_ENDPOINT: &str =
    "https://python-support-proxy.azurewebsites.net/api/qrRedirect";

/// Where respondents land after a one-time link has been used up.
pub const DEFAULT_SUPPORT_URL: &str = "https://pythonsupport.dtu.dk/";

/// Page that one-time links point back to.
pub const DEFAULT_PAGE_URL: &str = "https://pythonsupport.dtu.dk/survey/";

/// Remote endpoints the client talks to.
#[derive(Clone, Debug)]
pub struct Endpoints {
    /// Survey submission endpoint.
    pub survey: String,
    /// One-time token issuing endpoint.
    pub token: String,
    /// Signed QR link endpoint.
    pub qr_sign: String,
}

/// Names of the persisted session keys.
#[derive(Clone, Debug)]
pub struct StorageKeys {
    /// `date|secret` access credential.
    pub auth: String,
    /// Selected building number.
    pub building: String,
    /// Workshop-day preference (`"true"` / `"false"`).
    pub workshop_day: String,
    /// Kiosk mode flag (`"1"` or absent).
    pub kiosk: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            auth: "surveySupportAuth".into(),
            building: "selectedBuilding".into(),
            workshop_day: "workshopDay".into(),
            kiosk: "kioskMode".into(),
        }
    }
}

/// Post-submission timings.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    /// How long the thank-you notice stays up before the form resets.
    pub thank_you_display: Duration,
    /// Delay before a one-time-link respondent is sent to the support site.
    pub redirect_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            thank_you_display: Duration::from_millis(3000),
            redirect_delay: Duration::from_millis(7000),
        }
    }
}

/// Configuration for the survey client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    pub storage: StorageKeys,
    pub timing: Timing,
    /// Base URL of the survey page; one-time links are built on top of it.
    pub page_url: String,
    /// Off-site destination after a one-time link is spent or rejected.
    pub support_url: String,
    /// Building codes offered as quick picks next to the custom 101–499 range.
    pub quick_pick_buildings: Vec<u16>,
}

impl ClientConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                | Default                   |
    /// |-------------------------|---------------------------|
    /// | `SURVEY_ENDPOINT`       | [`DEFAULT_SURVEY_ENDPOINT`] |
    /// | `SURVEY_TOKEN_ENDPOINT` | [`DEFAULT_TOKEN_ENDPOINT`]  |
    /// | `SURVEY_QR_ENDPOINT`    | [`DEFAULT_QR_ENDPOINT`]     |
    /// | `SURVEY_PAGE_URL`       | [`DEFAULT_PAGE_URL`]        |
    /// | `SURVEY_SUPPORT_URL`    | [`DEFAULT_SUPPORT_URL`]     |
    /// | `SURVEY_QUICK_BUILDINGS`| `101,116,303,308,324,358` (comma separated) |
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.into());
        let quick_pick_buildings = std::env::var("SURVEY_QUICK_BUILDINGS")
            .ok()
            .map(|raw| parse_building_list(&raw))
            .unwrap_or_else(default_quick_picks);

        Self {
            endpoints: Endpoints {
                survey: var("SURVEY_ENDPOINT", DEFAULT_SURVEY_ENDPOINT),
                token: var("SURVEY_TOKEN_ENDPOINT", DEFAULT_TOKEN_ENDPOINT),
                qr_sign: var("SURVEY_QR_ENDPOINT", DEFAULT_QR_ENDPOINT),
            },
            storage: StorageKeys::default(),
            timing: Timing::default(),
            page_url: var("SURVEY_PAGE_URL", DEFAULT_PAGE_URL),
            support_url: var("SURVEY_SUPPORT_URL", DEFAULT_SUPPORT_URL),
            quick_pick_buildings,
        }
    }

    /// Configuration pointing every endpoint at a single proxy base URL
    /// (`{base}/api/surveyProxy`, `{base}/api/issueToken`, `{base}/api/qrRedirect`).
    pub fn for_proxy(base: &str, page_url: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            endpoints: Endpoints {
                survey: format!("{base}/api/surveyProxy"),
                token: format!("{base}/api/issueToken"),
                qr_sign: format!("{base}/api/qrRedirect"),
            },
            storage: StorageKeys::default(),
            timing: Timing::default(),
            page_url: page_url.to_string(),
            support_url: DEFAULT_SUPPORT_URL.into(),
            quick_pick_buildings: default_quick_picks(),
        }
    }
}

fn default_quick_picks() -> Vec<u16> {
    vec![101, 116, 303, 308, 324, 358]
}

/// Parse a comma-separated building list, skipping entries that are not numbers.
fn parse_building_list(raw: &str) -> Vec<u16> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<u16>().ok())
        .collect()
}
