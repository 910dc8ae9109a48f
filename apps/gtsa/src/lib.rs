//! # gtsa
//!
//! Command-line drivers over `gtsa-core`: argument parsing, run
//! configuration, input loading and result tables.

pub mod cli;
pub mod config;
pub mod output;
