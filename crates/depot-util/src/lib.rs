//! Shared utilities for depot.
//!
//! This crate provides cross-cutting concerns used by all other depot crates:
//! the unified error type, filesystem helpers, and terminal progress
//! indicators.

pub mod errors;
pub mod fs;
pub mod progress;
