//! Snippet extraction from C# test sources.
//!
//! The extractor walks the configured test directories, pulls every
//! string-literal `.DoString` argument out of the C# files, trims and
//! unescapes the Lua code, attributes each snippet to its test class
//! and method, and writes the corpus tree plus `manifest.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::compat;
use crate::error::{ExtractError, ExtractResult};
use crate::patterns;
use crate::snippet::Snippet;

/// C# bytes scanned before the call site when building the context
/// window used for version pins and error-expectation probes.
const CONTEXT_BEFORE: usize = 1000;
/// C# bytes scanned past the end of the matched call.
const CONTEXT_AFTER: usize = 500;

/// Filename fragments that mark generated or non-test sources.
const SKIP_NAME_MARKERS: &[&str] = &["AssemblyInfo", ".g.cs", "GlobalUsings", "_Hardwired"];

/// Extractor configuration.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Directories holding C# test sources. Missing entries are
    /// skipped silently so one layout works across checkouts.
    pub test_dirs: Vec<PathBuf>,
    /// Corpus root the fixtures and manifest are written under.
    pub output_dir: PathBuf,
}

impl ExtractConfig {
    pub fn new(test_dirs: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        ExtractConfig {
            test_dirs,
            output_dir: output_dir.into(),
        }
    }
}

/// Aggregate result of one extraction pass.
#[derive(Debug, Default)]
pub struct Extraction {
    pub snippets: Vec<Snippet>,
    /// Source files that could not be read, as `path: error` strings.
    /// Read failures skip the file rather than aborting the pass.
    pub errors: Vec<String>,
}

impl Extraction {
    pub fn total(&self) -> usize {
        self.snippets.len()
    }

    pub fn novasharp_only_count(&self) -> usize {
        self.snippets
            .iter()
            .filter(|s| s.compatibility.novasharp_only)
            .count()
    }

    /// Snippets that can run against at least one reference version.
    pub fn comparable_count(&self) -> usize {
        self.total() - self.novasharp_only_count()
    }

    /// Comparable snippets runnable under the given version.
    pub fn count_for_version(&self, version: &str) -> usize {
        self.snippets
            .iter()
            .filter(|s| s.compatibility.supports(version))
            .count()
    }
}

/// Walks test sources and materializes the fixture corpus.
#[derive(Debug)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub fn new(config: ExtractConfig) -> Self {
        Extractor { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// All candidate C# files under the configured directories, paired
    /// with their source label, sorted by label for stable manifests.
    pub fn discover_test_files(&self) -> Vec<(PathBuf, String)> {
        let mut files = Vec::new();
        for dir in &self.config.test_dirs {
            if !dir.is_dir() {
                continue;
            }
            for entry in WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(Result::ok)
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy();
                if !name.ends_with(".cs") || skip_file(&name) {
                    continue;
                }
                let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
                files.push((entry.path().to_path_buf(), source_label(dir, rel)));
            }
        }
        files.sort_by(|a, b| a.1.cmp(&b.1));
        files
    }

    /// Run extraction over every discovered file.
    pub fn extract(&self) -> Extraction {
        let mut extraction = Extraction::default();
        for (path, label) in self.discover_test_files() {
            match fs::read_to_string(&path) {
                Ok(content) => extraction
                    .snippets
                    .extend(extract_from_source(&label, &content)),
                Err(error) => extraction
                    .errors
                    .push(format!("{}: {}", path.display(), error)),
            }
        }
        extraction
    }

    /// Write every fixture file under the output directory.
    pub fn write_snippets(&self, extraction: &Extraction) -> ExtractResult<()> {
        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| ExtractError::io(&self.config.output_dir, e))?;
        for snippet in &extraction.snippets {
            let path = self.config.output_dir.join(snippet.output_rel_path());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| ExtractError::io(parent, e))?;
            }
            fs::write(&path, snippet.render()).map_err(|e| ExtractError::io(&path, e))?;
        }
        Ok(())
    }

    /// Serialize the manifest to `<output_dir>/manifest.json`.
    pub fn write_manifest(&self, manifest: &Manifest) -> ExtractResult<PathBuf> {
        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| ExtractError::io(&self.config.output_dir, e))?;
        let path = self.config.output_dir.join("manifest.json");
        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| ExtractError::manifest(&path, e))?;
        fs::write(&path, json).map_err(|e| ExtractError::io(&path, e))?;
        Ok(path)
    }
}

/// Extract every string-literal snippet from one source text.
///
/// Variable arguments are skipped (the Lua lives elsewhere), as are
/// literals that trim to nothing. Snippet indices count per test
/// method so repeated `DoString` calls get distinct filenames.
pub fn extract_from_source(source_label: &str, content: &str) -> Vec<Snippet> {
    let mut per_method: HashMap<String, usize> = HashMap::new();
    let mut snippets = Vec::new();

    for caps in patterns::RE_DOSTRING.captures_iter(content) {
        let code = match literal_code(&caps) {
            Some(code) => code,
            None => continue,
        };
        let trimmed = code.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (position, match_end) = caps
            .get(0)
            .map(|m| (m.start(), m.end()))
            .unwrap_or((0, 0));
        let line_number = content[..position].matches('\n').count() + 1;
        let test_class = containing_class(content, position);
        let test_method = containing_method(content, position);
        let context = context_window(content, position, match_end);
        let compatibility = compat::analyze(trimmed, context);
        let expects_error = patterns::ERROR_EXPECTING
            .iter()
            .any(|probe| probe.is_match(context));

        let counter = per_method
            .entry(format!("{}.{}", test_class, test_method))
            .or_insert(0);
        let snippet_index = *counter;
        *counter += 1;

        snippets.push(Snippet {
            code: trimmed.to_string(),
            source_file: source_label.to_string(),
            line_number,
            test_class,
            test_method,
            compatibility,
            expects_error,
            snippet_index,
        });
    }

    snippets
}

/// Decode the matched literal into Lua source, or `None` for a
/// variable argument.
fn literal_code(caps: &regex::Captures<'_>) -> Option<String> {
    if let Some(body) = caps.name("verbatim") {
        return Some(unescape_verbatim(body.as_str()));
    }
    if let Some(body) = caps.name("raw") {
        return Some(body.as_str().to_string());
    }
    if let Some(body) = caps.name("regular") {
        return Some(unescape_regular(body.as_str()));
    }
    if let Some(body) = caps.name("interp_verbatim") {
        return Some(unescape_verbatim(body.as_str()));
    }
    if let Some(body) = caps.name("interp") {
        return Some(unescape_regular(body.as_str()));
    }
    None
}

/// Undo doubled quotes in a verbatim literal.
fn unescape_verbatim(content: &str) -> String {
    content.replace("\"\"", "\"")
}

/// Undo standard C# escapes in a single left-to-right pass. Unknown
/// escapes are kept verbatim so malformed literals stay inspectable.
fn unescape_regular(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('0') => out.push('\0'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Name of the innermost class declared before `position`.
fn containing_class(content: &str, position: usize) -> String {
    patterns::RE_TEST_CLASS
        .captures_iter(&content[..position])
        .last()
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Name of the last test method declared before `position`.
fn containing_method(content: &str, position: usize) -> String {
    patterns::RE_TEST_METHOD
        .captures_iter(&content[..position])
        .last()
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// C# source around the call site. Window edges are clamped to char
/// boundaries so multi-byte source never panics the slice.
fn context_window(content: &str, position: usize, match_end: usize) -> &str {
    let start = floor_char_boundary(content, position.saturating_sub(CONTEXT_BEFORE));
    let end = floor_char_boundary(
        content,
        match_end.saturating_add(CONTEXT_AFTER).min(content.len()),
    );
    &content[start..end]
}

fn floor_char_boundary(content: &str, mut index: usize) -> usize {
    while !content.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn skip_file(name: &str) -> bool {
    SKIP_NAME_MARKERS.iter().any(|marker| name.contains(marker))
}

/// Label a discovered file as `<dir-name>/<relative-path>` with `/`
/// separators, matching the `@source` header format.
fn source_label(test_dir: &Path, rel: &Path) -> String {
    let rel = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    match test_dir.file_name() {
        Some(name) => format!("{}/{}", name.to_string_lossy(), rel),
        None => rel,
    }
}

/// Comparable snippet counts per reference version.
#[derive(Debug, Clone, Serialize)]
pub struct VersionCounts {
    #[serde(rename = "5.1")]
    pub lua_51: usize,
    #[serde(rename = "5.2")]
    pub lua_52: usize,
    #[serde(rename = "5.3")]
    pub lua_53: usize,
    #[serde(rename = "5.4")]
    pub lua_54: usize,
}

/// One snippet's row in the manifest.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub path: String,
    pub source: String,
    pub test: String,
    pub lua_versions: Vec<String>,
    pub novasharp_only: bool,
    pub expects_error: bool,
}

/// The persisted shape of `manifest.json`.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub generated_by: String,
    pub generated_at: String,
    pub total_snippets: usize,
    pub novasharp_only: usize,
    pub comparable: usize,
    pub by_version: VersionCounts,
    pub snippets: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn build(extraction: &Extraction) -> Self {
        Manifest {
            generated_by: "luaparity extract".to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_snippets: extraction.total(),
            novasharp_only: extraction.novasharp_only_count(),
            comparable: extraction.comparable_count(),
            by_version: VersionCounts {
                lua_51: extraction.count_for_version("5.1"),
                lua_52: extraction.count_for_version("5.2"),
                lua_53: extraction.count_for_version("5.3"),
                lua_54: extraction.count_for_version("5.4"),
            },
            snippets: extraction
                .snippets
                .iter()
                .map(|snippet| ManifestEntry {
                    path: snippet.output_rel_path(),
                    source: snippet.source_ref(),
                    test: snippet.test_name(),
                    lua_versions: snippet
                        .compatibility
                        .compatible_versions()
                        .iter()
                        .map(|v| v.to_string())
                        .collect(),
                    novasharp_only: snippet.compatibility.novasharp_only,
                    expects_error: snippet.expects_error,
                })
                .collect(),
        }
    }
}
