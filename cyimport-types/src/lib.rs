//! Shared DTOs for the cyimport workspace.
//!
//! # Design constraints
//! - Wire shapes mirror what the Cyoda backend and admin UI exchange; field names are camelCase there.
//! - Reports are written to disk and read by other tools. Prefer adding optional fields over changing
//!   semantics.

pub mod candidate;
pub mod fix;
pub mod instance;
pub mod report;
pub mod target;
pub mod wire;

/// Schema identifiers.
pub mod schema {
    pub const CYIMPORT_REPORT_V1: &str = "cyimport.report.v1";
}
