//! awsweep - declarative bulk deletion of AWS resources
//!
//! Resources are discovered per type, matched against a YAML filter document
//! of id/tag regex patterns, expanded into their dependents, and destroyed in
//! dependency order with bounded concurrency. Every run writes a YAML
//! manifest of what matched, whether or not anything was actually deleted.

pub mod cloud;
pub mod config;
pub mod engine;

pub use config::{ConfigError, FilterConfig};
pub use engine::{SweepOptions, SweepReport, Sweeper};
