//! Lua version compatibility inference.
//!
//! Each snippet is probed for version-gated syntax and stdlib usage,
//! and the surrounding C# source is checked for explicit version pins.
//! The result records which reference interpreters can run the snippet
//! and why the excluded ones were ruled out.

use crate::patterns;

/// Which reference versions a snippet can run under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMatrix {
    pub lua_51: bool,
    pub lua_52: bool,
    pub lua_53: bool,
    pub lua_54: bool,
    /// Set when the snippet uses syntax or state only NovaSharp has.
    pub novasharp_only: bool,
    /// Human-readable exclusion reasons, in detection order.
    pub reasons: Vec<String>,
}

impl Default for VersionMatrix {
    fn default() -> Self {
        VersionMatrix {
            lua_51: true,
            lua_52: true,
            lua_53: true,
            lua_54: true,
            novasharp_only: false,
            reasons: Vec::new(),
        }
    }
}

impl VersionMatrix {
    /// Versions still considered compatible, oldest first.
    pub fn compatible_versions(&self) -> Vec<&'static str> {
        let mut versions = Vec::new();
        if self.lua_51 {
            versions.push("5.1");
        }
        if self.lua_52 {
            versions.push("5.2");
        }
        if self.lua_53 {
            versions.push("5.3");
        }
        if self.lua_54 {
            versions.push("5.4");
        }
        versions
    }

    /// The `@lua-versions` header value for this matrix.
    pub fn version_string(&self) -> String {
        if self.novasharp_only {
            return "novasharp-only".to_string();
        }
        let versions = self.compatible_versions();
        if versions.is_empty() {
            return "none".to_string();
        }
        if versions.len() == 4 {
            return "5.1+".to_string();
        }
        versions.join(", ")
    }

    /// Whether the snippet can be compared against `version`.
    pub fn supports(&self, version: &str) -> bool {
        !self.novasharp_only && self.compatible_versions().contains(&version)
    }
}

/// Infer version compatibility for one snippet.
///
/// `context` is the C# source around the call site; an explicit
/// version pin there outranks feature probes on the Lua code itself.
pub fn analyze(code: &str, context: &str) -> VersionMatrix {
    let mut matrix = VersionMatrix::default();

    for (probe, reason) in patterns::NOVASHARP_SPECIFIC.iter() {
        if probe.is_match(code) {
            matrix.novasharp_only = true;
            matrix.reasons.push(format!("NovaSharp: {}", reason));
        }
    }

    apply_context_pin(&mut matrix, context);

    if matrix.novasharp_only {
        return matrix;
    }

    for (probe, reason) in patterns::LUA_54_FEATURES.iter() {
        if probe.is_match(code) {
            matrix.lua_51 = false;
            matrix.lua_52 = false;
            matrix.lua_53 = false;
            matrix.reasons.push(format!("Lua 5.4: {}", reason));
        }
    }

    for (probe, reason) in patterns::LUA_53_FEATURES.iter() {
        if probe.is_match(code) {
            matrix.lua_51 = false;
            matrix.lua_52 = false;
            matrix.reasons.push(format!("Lua 5.3+: {}", reason));
        }
    }

    for (probe, reason) in patterns::LUA_52_FEATURES.iter() {
        if probe.is_match(code) {
            matrix.lua_51 = false;
            matrix.reasons.push(format!("Lua 5.2+: {}", reason));
        }
    }

    for (probe, reason) in patterns::LUA_51_INCOMPATIBLE.iter() {
        if matrix.lua_51 && probe.is_match(code) {
            matrix.lua_51 = false;
            matrix.reasons.push(format!("Not Lua 5.1: {}", reason));
        }
    }

    for (probe, var) in patterns::INTEROP_VAR_PROBES.iter() {
        if probe.is_match(code)
            && !code.contains(&format!("{} =", var))
            && !code.contains(&format!("local {}", var))
        {
            matrix.novasharp_only = true;
            matrix.reasons.push(format!("Uses injected variable: {}", var));
            break;
        }
    }

    matrix
}

fn apply_context_pin(matrix: &mut VersionMatrix, context: &str) {
    if context.contains("Lua51") || context.contains("CompatibilityVersion.Lua_5_1") {
        matrix.lua_52 = false;
        matrix.lua_53 = false;
        matrix.lua_54 = false;
        matrix.reasons.push("Test targets Lua 5.1".to_string());
    } else if context.contains("Lua52") || context.contains("CompatibilityVersion.Lua_5_2") {
        matrix.lua_51 = false;
        matrix.reasons.push("Test targets Lua 5.2+".to_string());
    } else if context.contains("Lua53") || context.contains("CompatibilityVersion.Lua_5_3") {
        matrix.lua_51 = false;
        matrix.lua_52 = false;
        matrix.reasons.push("Test targets Lua 5.3+".to_string());
    } else if context.contains("Lua54") || context.contains("CompatibilityVersion.Lua_5_4") {
        matrix.lua_51 = false;
        matrix.lua_52 = false;
        matrix.lua_53 = false;
        matrix.reasons.push("Test targets Lua 5.4+".to_string());
    }
}
