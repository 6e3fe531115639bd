//! # survey_core
//!
//! Client-side core for the survey kiosk.
//!
//! Everything that the kiosk page decides on its own lives here: the daily
//! access-key cache, one-time link and signed QR issuance, verification of
//! one-time links on page load, survey submission and the user-facing error
//! taxonomy. Persistence and HTTP are injected through [`store::SessionStore`]
//! and [`transport::Transport`].

pub mod access;
pub mod client;
pub mod clock;
pub mod config;
pub mod courses;
pub mod form;
pub mod links;
pub mod models;
pub mod page;
pub mod preferences;
pub mod problem;
pub mod store;
pub mod submit;
pub mod transport;
pub mod verify;

pub use client::SurveyClient;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
