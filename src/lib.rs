//! `frap-curves` library crate.
//!
//! The binary (`frap`) is a thin wrapper around this library so that:
//!
//! - the processing stages are testable without spawning processes
//! - the pipeline can be driven from other front-ends (batch scripts, notebooks)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod series;
pub mod stats;
