//! Fixture metadata headers
//!
//! Every corpus fixture may start with a short comment preamble declaring
//! which Lua versions it targets, whether it only runs under NovaSharp,
//! and whether the snippet is expected to fail:
//!
//! ```text
//! -- @lua-versions: 5.1, 5.2, 5.3+
//! -- @novasharp-only: false
//! -- @expects-error: false
//! ```
//!
//! Directives must appear within the first ten lines; parsing stops at the
//! first line that is not a `--` comment. A missing or unreadable header
//! yields the default metadata, which is compatible with everything, so
//! metadata problems never block execution.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Maximum number of leading lines scanned for directives.
const HEADER_LINE_LIMIT: usize = 10;

/// Version and error-expectation metadata parsed from a fixture header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureMetadata {
    /// Declared version tokens, each exact ("5.3") or open-ended ("5.3+")
    pub lua_versions: Vec<String>,
    /// Fixture cannot run against any reference interpreter
    pub novasharp_only: bool,
    /// A non-zero exit code counts as success for this fixture
    pub expects_error: bool,
}

impl FixtureMetadata {
    /// Parse metadata from a fixture file header.
    ///
    /// Never fails: any I/O or parse problem returns the default metadata.
    pub fn parse(path: &Path) -> Self {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        let mut meta = Self::default();
        for line in BufReader::new(file).lines().take(HEADER_LINE_LIMIT) {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };
            if !line.starts_with("--") {
                break;
            }
            meta.apply_directive(&line);
        }
        meta
    }

    fn apply_directive(&mut self, line: &str) {
        if let Some((_, value)) = line.split_once("@lua-versions:") {
            let value = value.trim();
            if value.contains("novasharp-only") {
                self.novasharp_only = true;
            } else {
                self.lua_versions = value
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect();
            }
        }

        if line.contains("@novasharp-only: true") {
            self.novasharp_only = true;
        }

        if line.contains("@expects-error: true") {
            self.expects_error = true;
        }
    }

    /// Check whether this fixture can run against the given Lua version.
    ///
    /// NovaSharp-only fixtures are incompatible with every reference
    /// version. An empty version list means no stated constraint. Exact
    /// tokens match literally; `"5.3+"` style tokens match any target
    /// whose compressed number ("5.4" -> 54) is at least the base.
    pub fn is_compatible(&self, target_version: &str) -> bool {
        if self.novasharp_only {
            return false;
        }
        if self.lua_versions.is_empty() {
            return true;
        }
        if self.lua_versions.iter().any(|v| v == target_version) {
            return true;
        }

        let target_num = match version_num(target_version) {
            Some(n) => n,
            None => return false,
        };
        self.lua_versions
            .iter()
            .filter_map(|v| v.strip_suffix('+'))
            .filter_map(version_num)
            .any(|base| target_num >= base)
    }
}

/// Compress a dotted version string to an integer ("5.3" -> 53)
fn version_num(version: &str) -> Option<u32> {
    version.replace('.', "").parse().ok()
}
