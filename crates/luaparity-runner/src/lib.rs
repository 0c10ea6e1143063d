//! LuaParity fixture runner
//!
//! Executes the fixture corpus against a reference Lua interpreter and
//! the NovaSharp CLI:
//! - Prerequisite verification (fixtures dir, interpreter probe, build)
//! - Bounded parallel execution with per-invocation timeouts
//! - Captured stdout/stderr/exit-code persisted via the shared layout
//! - Deterministic run summary and results file
//!
//! The runner only reports; gating on divergence belongs to the
//! comparator.

pub mod error;
pub mod exec;
pub mod runner;

// Re-export main types
pub use error::{RunnerError, RunnerResult};
pub use runner::{
    FixtureResult, FixtureRunner, RunReport, RunStatus, RunSummary, RunnerConfig, SkipReason,
    DEFAULT_LUA_TIMEOUT, DEFAULT_NOVA_TIMEOUT,
};
