//! Configuration management for gwnetctl

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{GatewayError, GatewayResult};

/// Main gwnetctl configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Filesystem locations
    #[serde(default)]
    pub paths: ConfigPaths,
    /// Shell command execution
    #[serde(default)]
    pub commands: CommandSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPaths {
    /// Base configuration directory
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Directory holding WireGuard private key files
    #[serde(default = "default_wireguard_dir")]
    pub wireguard_dir: PathBuf,
    /// Persisted WireGuard interfaces and peers
    #[serde(default = "default_wireguard_store")]
    pub wireguard_store: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSettings {
    /// Prefix privileged commands with sudo when not running as root
    #[serde(default = "default_sudo")]
    pub sudo: bool,
    /// Shell used to interpret command lines
    #[serde(default = "default_shell")]
    pub shell: PathBuf,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("/etc/iqrf-gateway-webapp")
}

fn default_wireguard_dir() -> PathBuf {
    PathBuf::from("/etc/wireguard")
}

fn default_wireguard_store() -> PathBuf {
    PathBuf::from("/var/lib/iqrf-gateway-webapp/wireguard.json")
}

fn default_sudo() -> bool {
    true
}

fn default_shell() -> PathBuf {
    PathBuf::from("/bin/sh")
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            wireguard_dir: default_wireguard_dir(),
            wireguard_store: default_wireguard_store(),
        }
    }
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            sudo: default_sudo(),
            shell: default_shell(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            paths: ConfigPaths::default(),
            commands: CommandSettings::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GatewayError::ConfigError(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| GatewayError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GatewayResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GatewayError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| GatewayError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Ensure all directories exist
    pub fn ensure_directories(&self) -> GatewayResult<()> {
        let store_dir = self.paths.wireguard_store.parent();
        for dir in [Some(self.paths.config_dir.as_path()), Some(self.paths.wireguard_dir.as_path()), store_dir]
            .into_iter()
            .flatten()
        {
            std::fs::create_dir_all(dir)
                .map_err(|e| GatewayError::ConfigError(format!("Failed to create directory {:?}: {}", dir, e)))?;
        }
        Ok(())
    }
}
