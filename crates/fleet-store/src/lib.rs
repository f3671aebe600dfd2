//! # Fleet Store
//!
//! Whole-document JSON persistence for the agent registry and the dispatch
//! log. Each document is rewritten in full on every change; an in-process
//! mutex per document serializes read-modify-write cycles.

mod dispatch;
mod document;
mod registry;

pub use dispatch::DispatchLog;
pub use registry::AgentRegistry;
