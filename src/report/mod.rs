//! Reporting: output sheet composition and terminal summaries.

pub mod compose;
pub mod format;

pub use compose::*;
pub use format::*;
