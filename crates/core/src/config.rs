//! Replication target configuration
//!
//! The persisted resource is a JSON document (`replicator.conf` by default)
//! with fixed key names. When the file is missing a default
//! document is written and the caller is expected to stop so the operator
//! can fill it in before rerunning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while loading or creating the configuration resource
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to parse config file {} (delete it and rerun to regenerate defaults)",
        .path.display()
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write default config file {} (check directory permissions)", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("default config could not be serialized")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// On-disk configuration document
///
/// Field names are kept in the persisted format so existing files keep
/// working. `Target_Filename` may be omitted or left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Local home directory holding `.ssh/id_rsa` and `.ssh/known_hosts`
    #[serde(rename = "Local_User")]
    pub local_user: String,

    /// Minimum time in milliseconds between two transfers
    #[serde(rename = "Min_ms_Update_Period")]
    pub min_update_period_ms: u64,

    #[serde(rename = "Source_Filepath")]
    pub source_dir: String,

    #[serde(rename = "Source_Filename")]
    pub source_name: String,

    #[serde(rename = "Target_Filepath")]
    pub target_dir: String,

    #[serde(rename = "Target_Filename", default)]
    pub target_name: String,

    #[serde(rename = "Target_IP_Address")]
    pub target_address: String,

    #[serde(rename = "Target_Address_Port")]
    pub target_port: u16,

    #[serde(rename = "Target_Username")]
    pub target_user: String,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            local_user: "/home/user".to_string(),
            min_update_period_ms: 10,
            source_dir: "/home/user/".to_string(),
            source_name: "myTestFile.txt".to_string(),
            target_dir: "/home/user/Documents/".to_string(),
            target_name: String::new(),
            target_address: "192.168.1.126".to_string(),
            target_port: 22,
            target_user: "user".to_string(),
        }
    }
}

impl ConfigFile {
    /// Read and parse a config document from disk
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serialize this document to `path`, replacing any existing file
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Remote SSH endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub address: String,
    pub port: u16,
    pub user: String,
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.address, self.port)
    }
}

/// Fully resolved replication settings
///
/// Built once at startup and handed to every component; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationTarget {
    identity_home: PathBuf,
    source_dir: PathBuf,
    source_name: String,
    destination_dir: String,
    destination_name: String,
    destination_defaulted: bool,
    min_interval: Duration,
    endpoint: RemoteEndpoint,
}

impl ReplicationTarget {
    /// Validate a config document and resolve defaults
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        if file.source_name.trim().is_empty() {
            return Err(ConfigError::Invalid("Source_Filename must not be empty".into()));
        }
        if file.target_address.trim().is_empty() {
            return Err(ConfigError::Invalid("Target_IP_Address must not be empty".into()));
        }
        if file.target_user.trim().is_empty() {
            return Err(ConfigError::Invalid("Target_Username must not be empty".into()));
        }
        if file.target_port == 0 {
            return Err(ConfigError::Invalid("Target_Address_Port must be non-zero".into()));
        }

        let destination_defaulted = file.target_name.is_empty();
        let destination_name = if destination_defaulted {
            file.source_name.clone()
        } else {
            file.target_name
        };

        Ok(Self {
            identity_home: PathBuf::from(file.local_user),
            source_dir: PathBuf::from(file.source_dir),
            source_name: file.source_name,
            destination_dir: file.target_dir,
            destination_name,
            destination_defaulted,
            min_interval: Duration::from_millis(file.min_update_period_ms),
            endpoint: RemoteEndpoint {
                address: file.target_address,
                port: file.target_port,
                user: file.target_user,
            },
        })
    }

    /// Load and resolve the config document at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_file(ConfigFile::read(path)?)
    }

    /// Local file being replicated
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.source_name)
    }

    /// Remote file receiving the copy (always `/`-separated)
    pub fn destination_path(&self) -> String {
        join_remote(&self.destination_dir, &self.destination_name)
    }

    pub fn destination_name(&self) -> &str {
        &self.destination_name
    }

    /// Whether the destination filename was inherited from the source
    pub fn destination_defaulted(&self) -> bool {
        self.destination_defaulted
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    pub fn identity_home(&self) -> &Path {
        &self.identity_home
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.identity_home.join(".ssh").join("id_rsa")
    }

    pub fn known_hosts_path(&self) -> PathBuf {
        self.identity_home.join(".ssh").join("known_hosts")
    }
}

/// Result of [`load_or_init`]
#[derive(Debug)]
pub enum LoadOutcome {
    /// Existing configuration loaded and validated
    Loaded(ReplicationTarget),
    /// No configuration existed; defaults were written here
    Created(PathBuf),
}

/// Load the configuration, or write defaults when it does not exist yet
///
/// A `Created` outcome means the process must stop and ask the operator to
/// edit the new file before rerunning.
pub fn load_or_init(path: &Path) -> Result<LoadOutcome, ConfigError> {
    match std::fs::metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("Config file {} does not exist, creating defaults", path.display());
            ConfigFile::default().write(path)?;
            return Ok(LoadOutcome::Created(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    debug!("Loading config from {}", path.display());
    ReplicationTarget::load(path).map(LoadOutcome::Loaded)
}

fn join_remote(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}
