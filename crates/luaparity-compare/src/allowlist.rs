//! Known-divergence allowlist.
//!
//! The allowlist is a JSON array of fixture paths, relative to the
//! corpus root, whose mismatches are documented and accepted. It is
//! loaded once and handed to the comparator; classification itself
//! never reads files to decide membership.

use crate::error::{CompareError, CompareResult};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Set of fixture paths whose divergence is accepted.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    entries: HashSet<String>,
}

impl Allowlist {
    /// An empty allowlist; every mismatch stays a mismatch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an allowlist from explicit entries.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Allowlist {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Load an allowlist from a JSON array file.
    pub fn load(path: &Path) -> CompareResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| CompareError::allowlist(path, e))?;
        let entries: Vec<String> =
            serde_json::from_str(&text).map_err(|e| CompareError::allowlist(path, e))?;
        Ok(Self::from_entries(entries))
    }

    pub fn contains(&self, rel_path: &str) -> bool {
        self.entries.contains(rel_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
