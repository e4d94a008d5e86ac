//! Embeddable core library for cyimport.
//!
//! # Ports
//!
//! Network and time are abstracted behind the domain ports:
//! - [`SaveGateway`](cyimport_domain::SaveGateway): persist a candidate
//! - [`Clock`](cyimport_domain::Clock): uniqueness suffixes and report timestamps
//!
//! The [`adapters`] module provides in-memory implementations for embedding and testing.
//!
//! # Entry points
//!
//! - [`ImportOrchestrator::create_instances`](orchestrator::ImportOrchestrator::create_instances):
//!   one [`ImportInstance`](instance::ImportInstance) per record, for a caller-driven loop
//! - [`run_import`](pipeline::run_import): drive a whole batch with auto-fix and produce a report

pub mod adapters;
pub mod instance;
pub mod orchestrator;
pub mod pipeline;
pub mod settings;

// Re-export the domain ports so callers don't need cyimport-domain directly.
pub use cyimport_domain::{Clock, GatewayError, SaveGateway, SystemClock, TargetProfile};
