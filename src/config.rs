// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::engine_core::constants::{config as keys, timing};
use crate::engine_core::errors::OperError;
use crate::engine_core::traits::ConfigSource;

/// Process-level settings, resolved from the environment and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub config_path: Option<PathBuf>,
    pub log_level: String,
    pub log_format: String, // "json" or "text"
    pub server_name: String,
    pub kill_close_delay_ms: u64,
    /// Bound on extension manager calls. None waits forever.
    pub call_timeout_ms: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, OperError> {
        let kill_close_delay_ms = match env::var(keys::ENV_KILL_DELAY_MS) {
            Ok(v) => v.parse::<u64>().map_err(|e| {
                OperError::ConfigurationError(format!("{}: {}", keys::ENV_KILL_DELAY_MS, e))
            })?,
            Err(_) => timing::KILL_CLOSE_DELAY_MS,
        };
        let call_timeout_ms = match env::var(keys::ENV_CALL_TIMEOUT_MS) {
            Ok(v) => Some(v.parse::<u64>().map_err(|e| {
                OperError::ConfigurationError(format!("{}: {}", keys::ENV_CALL_TIMEOUT_MS, e))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            config_path: env::var(keys::ENV_CONFIG_PATH).ok().map(PathBuf::from),
            log_level: env::var(keys::ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string()),
            log_format: env::var(keys::ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string()),
            server_name: env::var(keys::ENV_SERVER_NAME)
                .unwrap_or_else(|_| keys::DEFAULT_SERVER_NAME.to_string()),
            kill_close_delay_ms,
            call_timeout_ms,
        })
    }

    pub fn kill_close_delay(&self) -> Duration {
        Duration::from_millis(self.kill_close_delay_ms)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: None,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            server_name: keys::DEFAULT_SERVER_NAME.to_string(),
            kill_close_delay_ms: timing::KILL_CLOSE_DELAY_MS,
            call_timeout_ms: None,
        }
    }
}

/// YAML-backed configuration subsystem.
///
/// The parsed document is swapped as a whole on `reload`, so `get` never
/// observes a half-read file.
pub struct YamlConfig {
    path: Option<PathBuf>,
    document: RwLock<Value>,
}

impl YamlConfig {
    /// Load from a file; `reload` re-reads the same path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OperError> {
        let path = path.as_ref().to_path_buf();
        let document = Self::read(&path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(Self {
            path: Some(path),
            document: RwLock::new(document),
        })
    }

    /// In-memory document with no backing file; `reload` keeps it as is.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, OperError> {
        Ok(Self {
            path: None,
            document: RwLock::new(serde_yaml_ng::from_str(yaml)?),
        })
    }

    pub fn empty() -> Self {
        Self {
            path: None,
            document: RwLock::new(Value::Null),
        }
    }

    fn read(path: &Path) -> Result<Value, OperError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OperError::ConfigurationError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_yaml_ng::from_str(&content)?)
    }
}

/// Walk a dotted key through nested mappings.
pub fn lookup_dotted<'a>(document: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(document, |node, segment| node.get(segment))
}

#[async_trait]
impl ConfigSource for YamlConfig {
    async fn reload(&self) -> Result<(), OperError> {
        let Some(path) = &self.path else {
            debug!("In-memory configuration, nothing to reload");
            return Ok(());
        };
        let fresh = Self::read(path)?;
        *self.document.write().await = fresh;
        info!("Reloaded configuration from {}", path.display());
        Ok(())
    }

    async fn get(&self, key: &str, default: Value) -> Value {
        let document = self.document.read().await;
        lookup_dotted(&document, key).cloned().unwrap_or(default)
    }
}
