//! Context inference engine.
//!
//! Classifies what an agent is doing (implementing, planning, reviewing, or
//! administering) from persisted ticket and session records. Inference never
//! fails: store errors are logged and degrade to the administrative context.

mod infer;
mod relevance;
mod summary;

pub use infer::{infer_all_active_contexts, infer_context, InferRequest};
pub use relevance::{is_context_relevant, relevant_categories};
pub use summary::{summarize, ActiveContextMap, NO_CONTEXT};
