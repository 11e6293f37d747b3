//! Terminal plotting of recovery curves.

pub mod ascii;

pub use ascii::*;
