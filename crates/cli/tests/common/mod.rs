//! Common utilities for integration tests

pub mod cli;

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory with a source file to replicate
pub struct Workspace {
    pub temp_dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("data.txt"), b"replicate me").unwrap();
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write a config pointing at this workspace; no `.ssh` keys exist here
    pub fn write_config(&self, name: &str) -> PathBuf {
        let dir = self.path().display().to_string();
        let config = serde_json::json!({
            "Local_User": dir,
            "Min_ms_Update_Period": 10,
            "Source_Filepath": dir,
            "Source_Filename": "data.txt",
            "Target_Filepath": "/tmp",
            "Target_IP_Address": "127.0.0.1",
            "Target_Address_Port": 22,
            "Target_Username": "user",
        });
        let path = self.join(name);
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        path
    }
}
