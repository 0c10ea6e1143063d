//! CLI configuration via environment variables
//!
//! LuaParity uses environment variables for optional configuration.
//! This keeps the CLI simple while allowing customization in CI.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Disable colored output (LUAPARITY_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            no_color: env::var("LUAPARITY_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Single test so parallel execution never races on the shared
    // process environment
    #[test]
    fn test_no_color_from_env() {
        env::remove_var("LUAPARITY_NO_COLOR");
        env::remove_var("NO_COLOR");
        assert!(!Config::from_env().no_color);

        env::set_var("LUAPARITY_NO_COLOR", "1");
        assert!(Config::from_env().no_color);
        env::remove_var("LUAPARITY_NO_COLOR");

        // Also honor NO_COLOR (standard)
        env::set_var("NO_COLOR", "1");
        assert!(Config::from_env().no_color);
        env::remove_var("NO_COLOR");
    }
}
