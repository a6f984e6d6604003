//! Error types for the ptrend-core crate
//!
//! Each module owns its error enum; they are collected here for callers that
//! want to match on all of them.

pub use crate::align::AlignmentError;
pub use crate::ingest::IngestError;
pub use crate::render::RenderError;
pub use crate::stats::StatsError;
pub use crate::store::StoreError;
