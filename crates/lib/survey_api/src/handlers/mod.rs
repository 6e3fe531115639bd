//! Request handlers.

pub mod qr;
pub mod survey;
pub mod tokens;
