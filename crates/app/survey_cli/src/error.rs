use survey_core::links::LinkError;
use survey_core::models::building::BuildingError;
use survey_core::submit::SubmitError;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("IO::{:?}: {}", .0.kind(), .0)]
    Io(#[from] std::io::Error),

    #[error("FlexiLogger::{:?}: {}", .0, .0)]
    FlexiLogger(#[from] flexi_logger::FlexiLoggerError),

    #[error("{}", .0)]
    Building(#[from] BuildingError),

    #[error("{}", .0)]
    Link(#[from] LinkError),

    #[error("{}", .0)]
    Submit(#[from] SubmitError),
}
