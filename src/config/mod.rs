//! Configuration module for Quire
//!
//! This module handles user preferences, environment overrides and
//! persistent storage to platform-specific directories.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
