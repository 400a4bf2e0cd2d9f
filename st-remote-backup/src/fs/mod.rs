//! Filesystem helpers for archive creation.

pub mod filter;
pub mod walker;

pub use filter::PathFilter;
