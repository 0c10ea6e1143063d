//! Extracted snippet model and fixture rendering.

use crate::compat::VersionMatrix;

/// One Lua snippet lifted out of a C# test.
#[derive(Debug, Clone)]
pub struct Snippet {
    /// Trimmed Lua source.
    pub code: String,
    /// Source file the snippet came from, with `/` separators.
    pub source_file: String,
    /// 1-indexed line of the `.DoString` call.
    pub line_number: usize,
    pub test_class: String,
    pub test_method: String,
    pub compatibility: VersionMatrix,
    /// True when the surrounding test asserts that execution fails.
    pub expects_error: bool,
    /// Zero-based index among snippets of the same test method.
    pub snippet_index: usize,
}

impl Snippet {
    /// Filename for this snippet. Later snippets of the same method
    /// carry an index suffix so they never collide.
    pub fn output_filename(&self) -> String {
        if self.snippet_index > 0 {
            format!("{}_{}.lua", self.test_method, self.snippet_index)
        } else {
            format!("{}.lua", self.test_method)
        }
    }

    /// Corpus-relative path, one directory per test class.
    pub fn output_rel_path(&self) -> String {
        format!("{}/{}", self.test_class, self.output_filename())
    }

    /// Qualified `Class.Method` name.
    pub fn test_name(&self) -> String {
        format!("{}.{}", self.test_class, self.test_method)
    }

    /// `file:line` origin reference.
    pub fn source_ref(&self) -> String {
        format!("{}:{}", self.source_file, self.line_number)
    }

    /// The `-- @key: value` metadata header lines.
    pub fn header(&self) -> String {
        let mut lines = vec![
            format!("-- @lua-versions: {}", self.compatibility.version_string()),
            format!("-- @novasharp-only: {}", self.compatibility.novasharp_only),
            format!("-- @expects-error: {}", self.expects_error),
            format!("-- @source: {}", self.source_ref()),
            format!("-- @test: {}", self.test_name()),
        ];
        if !self.compatibility.reasons.is_empty() {
            lines.push(format!(
                "-- @compat-notes: {}",
                self.compatibility.reasons.join("; ")
            ));
        }
        lines.join("\n")
    }

    /// Complete fixture file contents: header, a blank separator
    /// line, then the code with a single trailing newline.
    pub fn render(&self) -> String {
        format!("{}\n\n{}\n", self.header(), self.code)
    }
}
