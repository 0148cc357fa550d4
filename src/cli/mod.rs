//! Command-line interface for mapsearch.

mod commands;
pub mod helpers;
pub mod icons;

pub use commands::{is_verbose, run};
