//! HTTP inbound adapter exposing the procedure endpoint and health probes.

pub mod error;
pub mod health;
pub mod run;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::{ApiResult, envelope_response};
