//! User interface module.
//!
//! This module contains all UI-related functionality, including:
//! - CLI argument parsing and value layering (cli module)
//! - Console output and reporting (output module)

pub mod cli;
pub mod output;
