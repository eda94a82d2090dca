// Copyright 2025 eraflo
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

//! Process-level configuration.

use anyhow::{ensure, Context, Result};
use prism_hooks::RegistryConfig;
use prism_infra::SoftDeviceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything the SDK reads at attach time.
///
/// Every field has a default, so a partial (or empty) JSON object is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    /// Default `env_logger` filter, overridden by `RUST_LOG`.
    pub log_level: String,
    /// Context registry behaviour.
    pub registry: RegistryConfig,
    /// Limits of the software device created per runtime.
    pub device: SoftDeviceConfig,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            registry: RegistryConfig::default(),
            device: SoftDeviceConfig::default(),
        }
    }
}

impl PrismConfig {
    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Parses a JSON configuration and checks it.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("Malformed configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no runtime could work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.registry.min_major_version >= 1,
            "GL version floor {}.{} is not a GL version",
            self.registry.min_major_version,
            self.registry.min_minor_version
        );
        ensure!(
            self.device.max_texture_dimension > 0,
            "max_texture_dimension must be positive"
        );
        ensure!(self.device.max_memory_bytes > 0, "max_memory_bytes must be positive");
        Ok(())
    }
}
