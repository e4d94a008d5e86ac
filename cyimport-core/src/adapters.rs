//! In-memory port implementations for embedding and testing.

use chrono::{DateTime, TimeZone, Utc};
use cyimport_domain::{Clock, GatewayError, SaveGateway};
use cyimport_types::candidate::ImportCandidate;
use cyimport_types::wire::SaveResponse;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

type Responder =
    Box<dyn Fn(&str, &ImportCandidate) -> Result<SaveResponse, GatewayError> + Send + Sync>;

/// A request seen by [`ScriptedGateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSave {
    pub endpoint: String,
    pub candidate: ImportCandidate,
}

/// Gateway answering from a queue of canned responses, then from a fallback responder.
///
/// Every request is recorded so tests can inspect exactly what was sent.
pub struct ScriptedGateway {
    queue: Mutex<VecDeque<Result<SaveResponse, GatewayError>>>,
    fallback: Responder,
    seen: Mutex<Vec<RecordedSave>>,
}

impl std::fmt::Debug for ScriptedGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedGateway")
            .field("requests", &self.requests().len())
            .finish()
    }
}

impl ScriptedGateway {
    /// Answers with `responses` in order, then accepts everything.
    pub fn new(responses: Vec<Result<SaveResponse, GatewayError>>) -> Self {
        Self {
            queue: Mutex::new(responses.into()),
            fallback: Box::new(accept_all),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with `responder`.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str, &ImportCandidate) -> Result<SaveResponse, GatewayError> + Send + Sync + 'static,
    {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Box::new(responder),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedSave> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn respond(
        &self,
        endpoint: &str,
        candidate: &ImportCandidate,
    ) -> Result<SaveResponse, GatewayError> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedSave {
                endpoint: endpoint.to_string(),
                candidate: candidate.clone(),
            });

        let queued = self
            .queue
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        match queued {
            Some(r) => r,
            None => (self.fallback)(endpoint, candidate),
        }
    }
}

fn accept_all(_: &str, _: &ImportCandidate) -> Result<SaveResponse, GatewayError> {
    Ok(SaveResponse::ok())
}

impl SaveGateway for ScriptedGateway {
    async fn save(
        &self,
        endpoint: &str,
        candidate: &ImportCandidate,
    ) -> Result<SaveResponse, GatewayError> {
        let response = self.respond(endpoint, candidate);
        debug!(endpoint = %endpoint, ok = response.is_ok(), "scripted gateway answered");
        response
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Clock at `millis` since the Unix epoch; out-of-range values clamp to the epoch.
    pub fn at_millis(millis: i64) -> Self {
        let now = Utc
            .timestamp_millis_opt(millis)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self::new(now)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn queue_then_fallback() {
        let gw = ScriptedGateway::new(vec![Ok(SaveResponse::rejected(["nope"]))]);
        let c = ImportCandidate::new(json!({"name": "a"}));

        let first = gw.save("/x", &c).await.unwrap();
        let second = gw.save("/x", &c).await.unwrap();
        assert!(!first.success);
        assert!(second.success);
        assert_eq!(gw.requests().len(), 2);
        assert_eq!(gw.requests()[0].endpoint, "/x");
    }

    #[tokio::test]
    async fn from_fn_sees_candidate() {
        let gw = ScriptedGateway::from_fn(|_, c| {
            if c.name() == Some("dup") {
                Ok(SaveResponse::rejected(["Entity with same name exists"]))
            } else {
                Ok(SaveResponse::ok())
            }
        });
        let dup = ImportCandidate::new(json!({"name": "dup"}));
        let fresh = ImportCandidate::new(json!({"name": "fresh"}));
        assert!(!gw.save("/x", &dup).await.unwrap().success);
        assert!(gw.save("/x", &fresh).await.unwrap().success);
    }

    #[test]
    fn fixed_clock_reports_millis() {
        assert_eq!(FixedClock::at_millis(1234).now().timestamp_millis(), 1234);
    }
}
