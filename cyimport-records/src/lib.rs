//! Export file ingestion.
//!
//! cyimport consumes record files exported from a Cyoda environment. Loading is tolerant: a file that
//! fails to read or parse is reported alongside the good ones instead of aborting the batch.

mod load;

pub use load::{ExportLoadError, LoadedExport, flatten_records, load_exports};
