// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file (base values, missing keys fall back to defaults)
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, NodeweaveConfig, CONFIG_FILE_NAME};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Find the nodeweave configuration file
///
/// Search order:
/// 1. `NODEWEAVE_CONFIG_PATH` environment variable
/// 2. Current working directory: `./nodeweave.toml`
/// 3. Parent directories, up to 5 levels
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NODEWEAVE_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NODEWEAVE_CONFIG_PATH not found: {}",
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
        "nodeweave configuration file '{}' not found in any of these locations:\n{}\n\nSet NODEWEAVE_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file, then apply environment and CLI overrides
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// The result is not validated; call `validate_config` before use.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NodeweaveConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };
    let content = fs::read_to_string(&config_file)?;
    load_config_from_str(&content, cli_args)
}

/// Same as `load_config` for TOML text already in memory
pub fn load_config_from_str(
    content: &str,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NodeweaveConfig> {
    let mut config: NodeweaveConfig = toml::from_str(content)?;
    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }
    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NODEWEAVE_UNAVAILABLE_PARENT_POLICY` -> `deserialization.unavailable_parent_policy`
/// - `NODEWEAVE_UNAVAILABLE_CHILDREN_POLICY` -> `deserialization.unavailable_children_policy`
/// - `NODEWEAVE_UNAVAILABLE_REFERENCE_TARGET_POLICY` -> `deserialization.unavailable_reference_target_policy`
/// - `NODEWEAVE_DYNAMIC_INSTANTIATION` -> `deserialization.dynamic_instantiation`
/// - `NODEWEAVE_DEFAULT_CODEC` -> `serialization.default_codec`
/// - `NODEWEAVE_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut NodeweaveConfig) {
    if let Ok(value) = env::var("NODEWEAVE_UNAVAILABLE_PARENT_POLICY") {
        config.deserialization.unavailable_parent_policy = value;
    }
    if let Ok(value) = env::var("NODEWEAVE_UNAVAILABLE_CHILDREN_POLICY") {
        config.deserialization.unavailable_children_policy = value;
    }
    if let Ok(value) = env::var("NODEWEAVE_UNAVAILABLE_REFERENCE_TARGET_POLICY") {
        config.deserialization.unavailable_reference_target_policy = value;
    }
    if let Ok(value) = env::var("NODEWEAVE_DYNAMIC_INSTANTIATION") {
        config.deserialization.dynamic_instantiation = parse_flag(&value);
    }
    if let Ok(value) = env::var("NODEWEAVE_DEFAULT_CODEC") {
        config.serialization.default_codec = value;
    }
    if let Ok(value) = env::var("NODEWEAVE_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// Recognised keys: `parent_policy`, `children_policy`, `reference_target_policy` (or `policy`
/// for all three), `dynamic_instantiation`, `codec`, `pretty_json`, `log_level`, `log_format`.
pub fn apply_cli_overrides(config: &mut NodeweaveConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("policy") {
        config.deserialization.unavailable_parent_policy = value.clone();
        config.deserialization.unavailable_children_policy = value.clone();
        config.deserialization.unavailable_reference_target_policy = value.clone();
    }
    if let Some(value) = cli_args.get("parent_policy") {
        config.deserialization.unavailable_parent_policy = value.clone();
    }
    if let Some(value) = cli_args.get("children_policy") {
        config.deserialization.unavailable_children_policy = value.clone();
    }
    if let Some(value) = cli_args.get("reference_target_policy") {
        config.deserialization.unavailable_reference_target_policy = value.clone();
    }
    if let Some(value) = cli_args.get("dynamic_instantiation") {
        config.deserialization.dynamic_instantiation = parse_flag(value);
    }

    if let Some(value) = cli_args.get("codec") {
        config.serialization.default_codec = value.clone();
    }
    if let Some(value) = cli_args.get("pretty_json") {
        config.serialization.pretty_json = parse_flag(value);
    }

    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("log_format") {
        config.logging.format = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 6] = [
        "NODEWEAVE_UNAVAILABLE_PARENT_POLICY",
        "NODEWEAVE_UNAVAILABLE_CHILDREN_POLICY",
        "NODEWEAVE_UNAVAILABLE_REFERENCE_TARGET_POLICY",
        "NODEWEAVE_DYNAMIC_INSTANTIATION",
        "NODEWEAVE_DEFAULT_CODEC",
        "NODEWEAVE_LOG_LEVEL",
    ];

    fn clear_override_vars() {
        for var in OVERRIDE_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var("NODEWEAVE_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("NODEWEAVE_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing_file() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("absent.toml");

        env::set_var("NODEWEAVE_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("NODEWEAVE_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[serialization]").unwrap();
        writeln!(file, "default_codec = \"binary\"").unwrap();
        writeln!(file, "[deserialization]").unwrap();
        writeln!(file, "dynamic_instantiation = false").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.serialization.default_codec, "binary");
        assert!(!config.deserialization.dynamic_instantiation);
        assert_eq!(config.deserialization.unavailable_parent_policy, "throw_error");
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
        let mut config = NodeweaveConfig::default();

        env::set_var("NODEWEAVE_UNAVAILABLE_PARENT_POLICY", "proxy_nodes");
        env::set_var("NODEWEAVE_DYNAMIC_INSTANTIATION", "no");
        env::set_var("NODEWEAVE_LOG_LEVEL", "debug");

        apply_environment_overrides(&mut config);
        clear_override_vars();

        assert_eq!(config.deserialization.unavailable_parent_policy, "proxy_nodes");
        assert_eq!(config.deserialization.unavailable_children_policy, "throw_error");
        assert!(!config.deserialization.dynamic_instantiation);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = NodeweaveConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("policy".to_string(), "null_references".to_string());
        cli_args.insert("reference_target_policy".to_string(), "proxy_nodes".to_string());
        cli_args.insert("pretty_json".to_string(), "true".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.deserialization.unavailable_parent_policy, "null_references");
        assert_eq!(config.deserialization.unavailable_children_policy, "null_references");
        assert_eq!(config.deserialization.unavailable_reference_target_policy, "proxy_nodes");
        assert!(config.serialization.pretty_json);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[serialization]").unwrap();
        writeln!(file, "default_codec = \"json\"").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"warn\"").unwrap();

        env::set_var("NODEWEAVE_DEFAULT_CODEC", "binary");
        env::set_var("NODEWEAVE_LOG_LEVEL", "error");

        let mut cli_args = HashMap::new();
        cli_args.insert("log_level".to_string(), "trace".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();
        clear_override_vars();

        // CLI wins for the level, env wins for the codec
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.serialization.default_codec, "binary");
    }
}
