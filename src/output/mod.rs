//! Output module for reporting on a harvest database
//!
//! This module handles loading and printing the content counts and run
//! history shown by the `stats` command.

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics, RunStatistics};
