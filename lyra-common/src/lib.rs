//! # lyra Common Library
//!
//! Shared code for lyra tools:
//! - Error type
//! - TOML configuration loading and atomic writes
//! - Tracing initialisation
//! - Duration formatting for progress output

pub mod config;
pub mod error;
pub mod human_time;
pub mod logging;

pub use error::{Error, Result};
