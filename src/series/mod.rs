//! Per-sample series processing.
//!
//! Stages, in pipeline order:
//!
//! - group sheet columns into samples (`classify`)
//! - split off the prebleach rows and re-zero time (`prebleach`)
//! - resample onto the shared `pace` grid (`resample`)
//! - cut replicate columns to a common length (`align`)

pub mod align;
pub mod classify;
pub mod prebleach;
pub mod resample;

pub use align::*;
pub use classify::*;
pub use prebleach::*;
pub use resample::*;
