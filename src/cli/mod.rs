//! Command-line interface for photoscan.

mod commands;
pub mod icons;

pub use commands::{is_verbose, run};
