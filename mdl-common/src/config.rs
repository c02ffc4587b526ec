//! Root folder resolution and initialization
//!
//! The root folder holds everything the service writes: downloaded audio,
//! the durable job file, and failure exports.

use crate::Result;
use std::path::{Path, PathBuf};

/// Resolve the service root folder, in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. `root_folder` key in the global TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Create the root folder if it does not exist yet
pub fn ensure_root_folder(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Locate the optional global config file for the platform
fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("mdl").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/mdl/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mdl"))
        .unwrap_or_else(|| PathBuf::from("./mdl_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn cli_arg_takes_priority() {
        std::env::set_var("MDL_TEST_ROOT", "/from/env");
        let path = resolve_root_folder(Some("/from/cli"), "MDL_TEST_ROOT");
        std::env::remove_var("MDL_TEST_ROOT");
        assert_eq!(path, PathBuf::from("/from/cli"));
    }

    #[test]
    #[serial]
    fn env_var_beats_default() {
        std::env::set_var("MDL_TEST_ROOT", "/from/env");
        let path = resolve_root_folder(None, "MDL_TEST_ROOT");
        std::env::remove_var("MDL_TEST_ROOT");
        assert_eq!(path, PathBuf::from("/from/env"));
    }

    #[test]
    #[serial]
    fn empty_env_var_is_ignored() {
        std::env::set_var("MDL_TEST_ROOT", "");
        let path = resolve_root_folder(None, "MDL_TEST_ROOT");
        std::env::remove_var("MDL_TEST_ROOT");
        assert_ne!(path, PathBuf::from(""));
    }

    #[test]
    #[serial]
    fn ensure_root_folder_creates_nested_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_root_folder(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
