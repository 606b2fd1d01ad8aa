//! Capability filtering.
//!
//! A [`FilterEngine`] owns the process-lifetime [`FilterPolicy`] and computes
//! which registered capabilities an agent should see in a given context.

mod engine;
mod policy;
mod report;

pub use engine::{ContextCount, FilterEngine, FilterRequest, FilterResult, FilterStatistics};
pub use policy::{visible_set, FilterError, FilterOptions, FilterPolicy};
pub use report::{registry_report, CategoryReport, ConsolidationHint, ContextReport, RegistryReport};
