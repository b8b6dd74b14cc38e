use crate::errors::AppResult;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub data_file_name: String,
    /// Surface storage failures to callers instead of logging and carrying on.
    pub strict_storage: bool,
    pub log_filter: String,
    pub archive_page_size: usize,
    pub bridge_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file_name: "requests.json".to_string(),
            strict_storage: false,
            log_filter: "info".to_string(),
            archive_page_size: 10,
            bridge_capacity: 64,
        }
    }
}

impl AppConfig {
    /// Reads `config.yaml` from the data directory. A missing file yields the
    /// defaults; an unreadable one is logged and also yields the defaults.
    pub fn load(app_data_dir: &Path) -> Self {
        let path = app_data_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Self::default();
        }
        match Self::read(&path) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "ignoring malformed config");
                Self::default()
            }
        }
    }

    pub fn read(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)?;
        Ok(config.normalized())
    }

    pub fn data_file(&self, app_data_dir: &Path) -> PathBuf {
        app_data_dir.join(&self.data_file_name)
    }

    fn normalized(mut self) -> Self {
        if self.data_file_name.trim().is_empty() {
            self.data_file_name = Self::default().data_file_name;
        }
        self.archive_page_size = self.archive_page_size.max(1);
        self.bridge_capacity = self.bridge_capacity.max(1);
        self
    }
}
