//! Source patterns for snippet extraction.
//!
//! The feature probes run against extracted Lua code; everything else
//! runs against the surrounding C# source. Probe tables pair each
//! regex with the human-readable reason recorded in compat notes.

use once_cell::sync::Lazy;
use regex::Regex;

/// `.DoString(...)` calls with a string-literal or variable argument.
///
/// Alternatives are tried left to right, so the raw form must come
/// before the regular form or `"""..."""` would be consumed as an
/// empty regular literal.
pub(crate) static RE_DOSTRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)\.DoString\s*\(\s*(?:@"(?P<verbatim>(?:[^"]|"")*)"|"""(?P<raw>.*?)"""|"(?P<regular>(?:[^"\\]|\\.)*)"|\$@"(?P<interp_verbatim>(?:[^"]|"")*)"|\$"(?P<interp>(?:[^"\\]|\\.)*)"|(?P<variable>\w+))"#,
    )
    .unwrap()
});

/// TUnit test method declarations; group 1 is the method name.
pub(crate) static RE_TEST_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)\[(?:global::)?TUnit\.Core\.Test\].*?(?:public\s+)?(?:async\s+)?(?:Task|void)\s+(\w+)\s*\(",
    )
    .unwrap()
});

/// Class declarations; group 1 is the class name.
pub(crate) static RE_TEST_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:public\s+)?(?:sealed\s+)?class\s+(\w+)").unwrap());

fn compile(table: &[(&'static str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(pattern, reason)| (Regex::new(pattern).unwrap(), *reason))
        .collect()
}

/// Lua 5.4 syntax that earlier versions reject.
pub(crate) static LUA_54_FEATURES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"<const>", "const attribute"),
        (r"<close>", "close attribute"),
        (r"\bwarn\s*\(", "warn function"),
        (r"goto\s+\w+", "goto statement"),
        (r"::\w+::", "label"),
    ])
});

/// Lua 5.3 syntax and stdlib additions.
pub(crate) static LUA_53_FEATURES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"\b//\b", "floor division"),
        (r"&([^&]|$)", "bitwise AND"),
        (r"\|([^|]|$)", "bitwise OR"),
        (r"~([^=]|$)", "bitwise XOR/NOT"),
        (r"<<|>>", "bit shift"),
        (r"utf8\.", "utf8 library"),
        (r"table\.move\s*\(", "table.move"),
    ])
});

/// Lua 5.2 stdlib additions.
pub(crate) static LUA_52_FEATURES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"bit32\.", "bit32 library"),
        (r"_ENV\b", "_ENV variable"),
        (r"package\.searchpath", "package.searchpath"),
        (r"rawlen\s*\(", "rawlen function"),
    ])
});

/// Constructs Lua 5.1 rejects outright.
pub(crate) static LUA_51_INCOMPATIBLE: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"\b//\b", "floor division"),
        (r"&([^&]|$)", "bitwise AND"),
        (r"\|([^|]|$)", "bitwise OR"),
        (r"goto\s+\w+", "goto"),
        (r"<const>", "const attribute"),
        (r"<close>", "close attribute"),
    ])
});

/// Syntax only NovaSharp accepts.
pub(crate) static NOVASHARP_SPECIFIC: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"\b!=\b", "C-style not-equal"),
        (r"_NOVASHARP", "NovaSharp global"),
        (r"clr\.", "CLR interop"),
        (r"import\s*\(", "NovaSharp import"),
        (r"dynamic\.", "dynamic access"),
        (r"using\s+", "using statement (non-Lua)"),
    ])
});

/// Assertion shapes that mean the test expects the Lua code to fail.
pub(crate) static ERROR_EXPECTING: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Assert\.Throws",
        r"Assert\.That\([^)]*Throws",
        r"Should\.Throw",
        r"ExpectedException",
        r"ShouldFail",
        r"ExpectedError",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Variable names tests conventionally inject from the host side. A
/// snippet that reads one without defining it cannot run under a
/// reference interpreter.
pub(crate) static INTEROP_VAR_PROBES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        "o1", "o2", "obj", "myobj", "instance", "static", "testObj", "userdata",
    ]
    .iter()
    .map(|var| (Regex::new(&format!(r"\b{}\b", var)).unwrap(), *var))
    .collect()
});
