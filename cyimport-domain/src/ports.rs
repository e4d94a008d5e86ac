use chrono::{DateTime, Utc};
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::wire::SaveResponse;
use std::future::Future;
use thiserror::Error;

/// Remote endpoint that persists a candidate.
///
/// A validation rejection is a successful call returning `success: false`; `Err` is reserved for
/// transport-level problems.
pub trait SaveGateway: Send + Sync {
    fn save(
        &self,
        endpoint: &str,
        candidate: &ImportCandidate,
    ) -> impl Future<Output = Result<SaveResponse, GatewayError>> + Send;
}

/// Transport-level gateway failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway could not be reached (connect, timeout, TLS).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The gateway answered with a non-success HTTP status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a save response.
    #[error("malformed response: {message}")]
    Decode { message: String },
}

/// Time source for uniqueness suffixes and report timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
