//! LuaParity corpus extractor
//!
//! Mines the NovaSharp C# test suites for Lua code embedded in
//! `DoString` string literals and turns it into a runnable fixture
//! corpus:
//!
//! - decodes verbatim, raw, regular, and interpolated string literals
//! - attributes each snippet to its TUnit test class and method
//! - infers which reference Lua versions the snippet can run under
//! - writes one fixture file per snippet plus a `manifest.json` index
//!
//! Fixture headers use the `-- @key: value` directive format the rest
//! of the pipeline parses, so extraction output feeds straight into
//! the runner and comparator.

pub mod compat;
pub mod error;
pub mod extract;
pub mod snippet;

mod patterns;

pub use compat::{analyze, VersionMatrix};
pub use error::{ExtractError, ExtractResult};
pub use extract::{
    extract_from_source, ExtractConfig, Extraction, Extractor, Manifest, ManifestEntry,
    VersionCounts,
};
pub use snippet::Snippet;
