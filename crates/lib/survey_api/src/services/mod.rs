//! Token and signing services.

pub mod signing;
pub mod tokens;
