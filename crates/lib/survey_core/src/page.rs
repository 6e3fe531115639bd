//! Page-load inputs and the state a page opens in.

use url::Url;

use crate::form::FormControls;
use crate::models::building::BuildingNumber;
use crate::verify::Verification;

/// Query parameters stripped from the URL after a reset.
const RESET_STRIPPED: &[&str] = &["reset", "t", "token", "b", "wd"];

/// Query parameters the kiosk page understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageParams {
    url: Url,
    /// One-time token from `t` (preferred) or `token`.
    pub token: Option<String>,
    /// Raw `b` value.
    pub building: Option<String>,
    /// `wd=1`.
    pub workshop_day: bool,
    /// `reset=1`.
    pub reset: bool,
}

impl PageParams {
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(raw)?;
        let get = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };
        let token = get("t")
            .filter(|t| !t.is_empty())
            .or_else(|| get("token").filter(|t| !t.is_empty()));

        Ok(Self {
            token,
            building: get("b"),
            workshop_day: get("wd").as_deref() == Some("1"),
            reset: get("reset").as_deref() == Some("1"),
            url,
        })
    }

    /// Whether the page came from a printed QR/building link.
    pub fn is_qr_link(&self) -> bool {
        self.building.is_some()
    }

    /// The page URL without `reset`, `t`, `token`, `b` and `wd`; other
    /// parameters are kept in order.
    pub fn cleaned_url(&self) -> String {
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| !RESET_STRIPPED.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = self.url.clone();
        url.set_fragment(None);
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        url.into()
    }
}

/// Which screen the page shows first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    BuildingSelection,
    Survey,
}

/// State of a freshly loaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub params: PageParams,
    /// Whether the supporter login dialog covers the page.
    pub login_required: bool,
    pub screen: Screen,
    pub building: Option<BuildingNumber>,
    /// Default answer for the workshop question.
    pub workshop_default: bool,
    pub kiosk: bool,
    pub verification: Verification,
    pub form: FormControls,
}

impl PageState {
    /// Whether the supporter-only controls (link/QR generation) are shown.
    pub fn supporter_controls_visible(&self) -> bool {
        !self.login_required && self.params.token.is_none()
    }
}

/// Outcome of loading a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoad {
    /// `reset=1`: state was cleared; navigate to `next_url`.
    Reset { next_url: String },
    Ready(Box<PageState>),
}
