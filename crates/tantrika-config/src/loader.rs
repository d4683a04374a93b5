// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, TantrikaConfig};
use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "tantrika.toml";

/// Find the configuration file
///
/// Search order:
/// 1. `TANTRIKA_CONFIG_PATH` environment variable
/// 2. `./tantrika.toml`
/// 3. Up to five parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("TANTRIKA_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by TANTRIKA_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet TANTRIKA_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// * `config_path` - Path to the file. If `None`, [`find_config_file`] is used.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns an error if the file is not found, cannot be read, contains invalid TOML or an
/// override value does not parse.
/// Values are not validated here; see [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<TantrikaConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: TantrikaConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Apply environment variable overrides
///
/// Supported environment variables:
/// - `TANTRIKA_DT` -> `simulation.dt`
/// - `TANTRIKA_DURATION` -> `simulation.duration`
/// - `TANTRIKA_SEED` -> `simulation.seed`
/// - `TANTRIKA_LOG_LEVEL` -> `logging.level`
/// - `TANTRIKA_DATA_DIR` -> `output.data_dir`
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` naming the variable if a numeric value does not parse.
pub fn apply_environment_overrides(config: &mut TantrikaConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("TANTRIKA_DT") {
        config.simulation.dt = parse_override("TANTRIKA_DT", &value)?;
    }
    if let Ok(value) = env::var("TANTRIKA_DURATION") {
        config.simulation.duration = parse_override("TANTRIKA_DURATION", &value)?;
    }
    if let Ok(value) = env::var("TANTRIKA_SEED") {
        config.simulation.seed = parse_override("TANTRIKA_SEED", &value)?;
    }
    if let Ok(level) = env::var("TANTRIKA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(dir) = env::var("TANTRIKA_DATA_DIR") {
        config.output.data_dir = PathBuf::from(dir);
    }
    Ok(())
}

/// Apply CLI argument overrides
///
/// Keys: `dt`, `duration`, `seed`, `log_level`, `data_dir`. Unknown keys are ignored.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` naming the key if a numeric value does not parse.
pub fn apply_cli_overrides(
    config: &mut TantrikaConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    if let Some(value) = cli_args.get("dt") {
        config.simulation.dt = parse_override("dt", value)?;
    }
    if let Some(value) = cli_args.get("duration") {
        config.simulation.duration = parse_override("duration", value)?;
    }
    if let Some(value) = cli_args.get("seed") {
        config.simulation.seed = parse_override("seed", value)?;
    }
    if let Some(level) = cli_args.get("log_level") {
        config.logging.level = level.clone();
    }
    if let Some(dir) = cli_args.get("data_dir") {
        config.output.data_dir = PathBuf::from(dir);
    }
    Ok(())
}

fn parse_override<T>(key: &str, raw: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        ConfigError::InvalidValue(format!("{} = '{}': {}", key, raw, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 5] = [
        "TANTRIKA_DT",
        "TANTRIKA_DURATION",
        "TANTRIKA_SEED",
        "TANTRIKA_LOG_LEVEL",
        "TANTRIKA_DATA_DIR",
    ];

    fn clear_overrides() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var("TANTRIKA_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("TANTRIKA_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing_file() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        env::set_var("TANTRIKA_CONFIG_PATH", dir.path().join("absent.toml"));
        let result = find_config_file();
        env::remove_var("TANTRIKA_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "dt = 0.0002").unwrap();
        writeln!(file, "seed = 11").unwrap();
        writeln!(file, "[synapse]").unwrap();
        writeln!(file, "kernel = \"exp\"").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.simulation.dt, 0.0002);
        assert_eq!(config.simulation.seed, 11);
        assert_eq!(config.synapse.kernel, "exp");
        assert_eq!(config.neuron.tau, 0.01);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")), None);
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = TantrikaConfig::default();

        clear_overrides();
        env::set_var("TANTRIKA_DT", "0.00005");
        env::set_var("TANTRIKA_SEED", "99");
        env::set_var("TANTRIKA_DATA_DIR", "/tmp/tantrika-out");

        let result = apply_environment_overrides(&mut config);
        clear_overrides();

        result.unwrap();
        assert_eq!(config.simulation.dt, 0.00005);
        assert_eq!(config.simulation.seed, 99);
        assert_eq!(config.simulation.duration, 0.1);
        assert_eq!(config.output.data_dir, PathBuf::from("/tmp/tantrika-out"));
    }

    #[test]
    fn test_malformed_environment_override_is_rejected() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let mut config = TantrikaConfig::default();

        env::set_var("TANTRIKA_DT", "1e-4s");
        let result = apply_environment_overrides(&mut config);
        clear_overrides();

        match result {
            Err(ConfigError::InvalidValue(message)) => {
                assert!(message.contains("TANTRIKA_DT"), "{}", message);
                assert!(message.contains("1e-4s"), "{}", message);
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
        assert_eq!(config.simulation.dt, TantrikaConfig::default().simulation.dt);
    }

    #[test]
    fn test_load_config_propagates_bad_override() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).unwrap();

        let mut cli_args = HashMap::new();
        cli_args.insert("seed".to_string(), "-3".to_string());
        let result = load_config(Some(&config_path), Some(&cli_args));

        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = TantrikaConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("duration".to_string(), "0.5".to_string());
        cli_args.insert("log_level".to_string(), "debug".to_string());
        cli_args.insert("unknown".to_string(), "ignored".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.simulation.duration, 0.5);
        assert_eq!(config.logging.level, "debug");

        cli_args.insert("dt".to_string(), "abc".to_string());
        let err = apply_cli_overrides(&mut config, &cli_args).unwrap_err();
        assert!(err.to_string().contains("dt = 'abc'"), "{}", err);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_overrides();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "dt = 0.001").unwrap();
        writeln!(file, "duration = 1.0").unwrap();

        env::set_var("TANTRIKA_DT", "0.0005");
        env::set_var("TANTRIKA_DURATION", "2.0");

        let mut cli_args = HashMap::new();
        cli_args.insert("dt".to_string(), "0.00025".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_overrides();

        // CLI wins for dt, env wins for duration (no CLI override)
        assert_eq!(config.simulation.dt, 0.00025);
        assert_eq!(config.simulation.duration, 2.0);
    }
}
