//! Core data types for depot.
//!
//! This crate defines the fundamental types the resolution core operates on:
//! project version coordinates, the per-coordinate store record with its
//! transitive dependency report, the [`store::CoordinateStore`] seam through
//! which all corpus reads happen, and global configuration.
//!
//! This crate is intentionally free of resolution logic.

pub mod config;
pub mod coordinate;
pub mod metadata;
pub mod store;
