//! Types shared by the waitlist service, its storage layer and its clients.

pub mod domain;
pub mod error;
pub mod protocol;
pub mod validation;
