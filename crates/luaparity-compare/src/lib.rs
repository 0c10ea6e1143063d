//! LuaParity output comparator
//!
//! Takes the captures a runner pass left behind and decides, fixture
//! by fixture, whether NovaSharp and the reference interpreter agree:
//! - Normalizes both outputs through an ordered pipeline of pure steps
//! - Classifies each pair into a single status
//! - Downgrades mismatches that are version noise or documented
//! - Aggregates everything into `comparison.json` and an exit code

pub mod allowlist;
pub mod classify;
pub mod compare;
pub mod error;
pub mod normalize;
pub mod report;

pub use allowlist::Allowlist;
pub use classify::{classify, Comparison, Status};
pub use compare::{Comparator, CompareConfig};
pub use error::{CompareError, CompareResult};
pub use normalize::normalize;
pub use report::{BothErrorEntry, DivergenceEntry, ExitMode, MismatchEntry, Report, Tally};
