use crate::instance::ImportInstance;
use cyimport_domain::{Clock, SaveGateway, SystemClock, TargetProfile};
use cyimport_types::candidate::ImportCandidate;
use std::sync::Arc;
use tracing::debug;

/// Fans a batch of records out into one [`ImportInstance`] each, for one target profile.
pub struct ImportOrchestrator<G> {
    profile: Arc<TargetProfile>,
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
}

impl<G: SaveGateway> ImportOrchestrator<G> {
    pub fn new(profile: TargetProfile, gateway: Arc<G>) -> Self {
        Self {
            profile: Arc::new(profile),
            gateway,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    /// One instance per record, in input order. Does not touch the network.
    pub fn create_instances<I>(&self, records: I) -> Vec<ImportInstance<G>>
    where
        I: IntoIterator<Item = ImportCandidate>,
    {
        let instances: Vec<_> = records
            .into_iter()
            .map(|candidate| {
                ImportInstance::new(
                    candidate,
                    self.profile.clone(),
                    self.gateway.clone(),
                    self.clock.clone(),
                )
            })
            .collect();
        debug!(
            kind = %self.profile.kind,
            instances = instances.len(),
            "created import instances"
        );
        instances
    }
}
