//! Local output written by the pipeline.
//!
//! # Submodules
//!
//! - [`failed`]: Saves undeliverable posts as JSON for manual recovery
//!
//! Nothing is written on a successful run.

pub mod failed;
