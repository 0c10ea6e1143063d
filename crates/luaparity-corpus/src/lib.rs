//! LuaParity corpus model
//!
//! Shared foundation for the fixture pipeline:
//! - Fixture metadata headers and version compatibility decisions
//! - Corpus discovery (sorted, relative fixture paths)
//! - The captured-output layout linking the runner's writes to the
//!   comparator's reads
//!
//! The runner and the comparator both depend on this crate so that the
//! two phases can never disagree about where a fixture's captures live
//! or what its metadata says.

pub mod discovery;
pub mod error;
pub mod layout;
pub mod metadata;

// Re-export main types
pub use discovery::{find_captured_rel_paths, find_fixture_rel_paths};
pub use error::{CorpusError, CorpusResult};
pub use layout::{ExecutionOutcome, InterpreterTag, OutputLayout, NOT_RUN};
pub use metadata::FixtureMetadata;
