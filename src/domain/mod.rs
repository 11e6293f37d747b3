//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - column roles and measured channels (`Role`, `Channel`, `ColumnKey`)
//! - the ingested sheet and per-sample series (`RawTable`, `Sample`)
//! - resampled series and output sheets (`ResampledSeries`, `OutputTable`)
//! - the resolved run configuration (`RunConfig`)

pub mod types;

pub use types::*;
