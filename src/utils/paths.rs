use std::env;
use std::path::PathBuf;

// =============================================================================
// Core Path Functions
// =============================================================================

/// Get user home directory
/// Prefers $HOME; falls back to the platform lookup from `dirs`.
/// NEVER use "~" as Rust's std::fs does not expand it
pub fn get_home_dir() -> Result<PathBuf, String> {
    env::var("HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(dirs::home_dir)
        .ok_or_else(|| "HOME environment variable not set".to_string())
}

/// Get Mugen data root directory
/// Priority:
/// 1. MUGEN_ROOT environment variable
/// 2. Default to ~/.mugen
pub fn get_mugen_root() -> Result<PathBuf, String> {
    if let Ok(root) = env::var("MUGEN_ROOT") {
        return Ok(PathBuf::from(root));
    }
    Ok(get_home_dir()?.join(".mugen"))
}

// =============================================================================
// Config File
// =============================================================================

/// Get config file path
/// Priority:
/// 1. MUGEN_CONFIG environment variable (full path to the YAML file)
/// 2. <mugen_root>/config.yaml
pub fn get_config_path() -> Result<PathBuf, String> {
    if let Ok(path) = env::var("MUGEN_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    Ok(get_mugen_root()?.join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_do_not_use_tilde() {
        let home = get_home_dir().unwrap();
        assert!(!home.to_string_lossy().contains('~'));

        let config = get_config_path().unwrap();
        assert!(!config.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_config_path_is_yaml() {
        // Only meaningful without an explicit override
        if env::var("MUGEN_CONFIG").is_err() {
            let config = get_config_path().unwrap();
            assert_eq!(config.file_name().unwrap(), "config.yaml");
        }
    }
}
