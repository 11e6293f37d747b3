//! Input/output helpers.
//!
//! - CSV ingest of the measurement sheet (`ingest`)
//! - output sheet export, never overwriting (`export`)
//! - JSON run summary (`summary`)

pub mod export;
pub mod ingest;
pub mod summary;

pub use export::*;
pub use ingest::*;
pub use summary::*;
