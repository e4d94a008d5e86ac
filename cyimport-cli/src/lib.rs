//! Library half of the `cyimport` binary: configuration and rule explanations.

pub mod config;
pub mod explain;
