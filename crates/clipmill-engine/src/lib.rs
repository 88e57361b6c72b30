//! Clip batch orchestration.
//!
//! [`ClipEngine`] fans one source video out to N style renders, tracks each
//! clip's lifecycle independently, and aggregates batch state. One style
//! failing never disturbs its siblings; partial completion is an expected
//! terminal state.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod store;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use orchestrator::ClipEngine;
pub use source::{FsSourceResolver, SourceResolver, StaticResolver};
pub use store::{ClipStore, MemoryClipStore};
