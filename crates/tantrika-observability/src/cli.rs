// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-tantrika-npu-engine` to raise one crate to `debug`.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (`all` or comma-separated names)
pub const DEBUG_ENV_VAR: &str = "TANTRIKA_DEBUG";

/// Parse debug flags from command-line arguments
///
/// # Example
/// ```rust
/// use tantrika_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(std::env::args());
/// if flags.is_enabled("tantrika-npu-engine") {
///     // wiring and per-binding detail will be logged
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Looks for `--debug-{crate-name}` and `--debug-all`; other arguments are ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Add crates named in a `TANTRIKA_DEBUG` style value.
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enable(crate_name);
            }
        }
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string());
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn enabled_crates(&self) -> Vec<&String> {
        self.enabled_crates.iter().collect()
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` if enabled, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Filter directives for `EnvFilter`, e.g. `tantrika_npu_engine=debug,info`.
    ///
    /// Tracing targets are module paths, so crate names are written with underscores.
    /// `default_level` applies to everything else.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|name| format!("{}=debug", name.replace('-', "_")))
            .collect();
        filters.push(default_level.to_string());
        filters.join(",")
    }
}

/// Debug flags from the process arguments plus `TANTRIKA_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV_VAR) {
        flags.merge_env_value(&value);
    }
    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variables:
  TANTRIKA_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  TANTRIKA_DEBUG=all                            Enable debug for all crates
  TANTRIKA_TRACE_TICKS=1                        Trace every spike of every tick

Examples:
  --debug-tantrika-npu-engine
  TANTRIKA_DEBUG=tantrika-npu-engine,tantrika-config
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(args(&["tantrika-simulate", "--debug-tantrika-npu-engine"]));
        assert!(flags.is_enabled("tantrika-npu-engine"));
        assert!(!flags.is_enabled("tantrika-config"));
        assert!(flags.any_enabled());
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(args(&["--debug-all"]));
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_env_value() {
        let mut flags = CrateDebugFlags::default();
        flags.merge_env_value(" tantrika-config, ,tantrika ");
        assert_eq!(flags.enabled_crates(), vec!["tantrika", "tantrika-config"]);

        let mut all = CrateDebugFlags::default();
        all.merge_env_value("all");
        assert_eq!(all.enabled_crates.len(), KNOWN_CRATES.len());
    }

    #[test]
    fn test_filter_string_uses_module_paths() {
        let flags = CrateDebugFlags::from_args(args(&["--debug-tantrika-npu-engine"]));
        assert_eq!(flags.to_filter_string("warn"), "tantrika_npu_engine=debug,warn");
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(args(&["--debug-tantrika-config"]));
        assert_eq!(flags.log_level("tantrika-config"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("tantrika-npu-neural"), tracing::Level::INFO);
    }
}
