//! Domain and wire models shared by the client and the proxy.

pub mod building;
pub mod survey;
pub mod wire;

pub use building::{BuildingError, BuildingNumber, BuildingTag};
pub use survey::{Role, SurveyError, SurveyForm};
