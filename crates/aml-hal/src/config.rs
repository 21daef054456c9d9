//! Platform configuration
//!
//! Only the locations of things; every node path and policy constant is
//! fixed by the Amlogic kernel drivers.

use crate::{AmlError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// System-wide configuration file
pub const CONFIG_PATH: &str = "/etc/aml-utils/config.toml";

/// Environment variable overriding [`CONFIG_PATH`]
pub const CONFIG_ENV: &str = "AML_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Directory sysfs node paths are resolved under
    pub sysfs_root: PathBuf,
    /// File holding the CPU `Hardware` line
    pub cpuinfo_path: PathBuf,
    /// `su` binary used for permission fix-up
    pub su_binary: PathBuf,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/"),
            cpuinfo_path: PathBuf::from("/proc/cpuinfo"),
            su_binary: PathBuf::from("/system/xbin/su"),
        }
    }
}

impl PlatformConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AmlError::ConfigNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path`, then `$AML_CONFIG`, then the system file, falling
    /// back to defaults when none exists
    ///
    /// An explicit `path` must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_first_existing(env_path.as_deref(), Path::new(CONFIG_PATH))
    }

    fn load_first_existing(env_path: Option<&Path>, system_path: &Path) -> Result<Self> {
        if let Some(env_path) = env_path {
            if env_path.exists() {
                return Self::load(env_path);
            }
            tracing::warn!(
                "{} points to missing file {}",
                CONFIG_ENV,
                env_path.display()
            );
        }

        if system_path.exists() {
            return Self::load(system_path);
        }

        tracing::warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = PlatformConfig::default();
        assert_eq!(config.sysfs_root, PathBuf::from("/"));
        assert_eq!(config.su_binary, PathBuf::from("/system/xbin/su"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: PlatformConfig = toml::from_str("sysfs_root = \"/tmp/fake\"\n").unwrap();
        assert_eq!(config.sysfs_root, PathBuf::from("/tmp/fake"));
        assert_eq!(config.cpuinfo_path, PathBuf::from("/proc/cpuinfo"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        let config = PlatformConfig {
            su_binary: PathBuf::from("/sbin/su"),
            ..PlatformConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(PlatformConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = PlatformConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(AmlError::ConfigNotFound(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "sysfs_root = [").unwrap();
        assert!(matches!(
            PlatformConfig::load(&path),
            Err(AmlError::TomlParse(_))
        ));
    }

    #[test]
    fn test_env_file_missing_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = PlatformConfig::load_first_existing(
            Some(&dir.path().join("absent.toml")),
            &dir.path().join("system.toml"),
        )
        .unwrap();
        assert_eq!(config, PlatformConfig::default());
    }

    #[test]
    fn test_env_file_missing_uses_system_file() {
        let dir = TempDir::new().unwrap();
        let system = dir.path().join("system.toml");
        std::fs::write(&system, "su_binary = \"/sbin/su\"\n").unwrap();

        let config =
            PlatformConfig::load_first_existing(Some(&dir.path().join("absent.toml")), &system)
                .unwrap();
        assert_eq!(config.su_binary, PathBuf::from("/sbin/su"));
    }

    #[test]
    fn test_env_file_wins_over_system_file() {
        let dir = TempDir::new().unwrap();
        let env_file = dir.path().join("env.toml");
        let system = dir.path().join("system.toml");
        std::fs::write(&env_file, "sysfs_root = \"/tmp/env\"\n").unwrap();
        std::fs::write(&system, "sysfs_root = \"/tmp/system\"\n").unwrap();

        let config = PlatformConfig::load_first_existing(Some(&env_file), &system).unwrap();
        assert_eq!(config.sysfs_root, PathBuf::from("/tmp/env"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let result = PlatformConfig::load_or_default(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(AmlError::ConfigNotFound(_))));
    }
}
