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

//! Registry settings.

use serde::{Deserialize, Serialize};

/// Behaviour of the [`ContextRegistry`](crate::ContextRegistry) hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Lowest GL major version a runtime is created for.
    pub min_major_version: u32,
    /// Lowest GL minor version a runtime is created for.
    pub min_minor_version: u32,
    /// Raise context requests below the floor to it, with the compatibility profile.
    pub upgrade_legacy_requests: bool,
    /// Request a debug context for every `wglCreateContextAttribsARB` call.
    pub force_debug_context: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            min_major_version: 4,
            min_minor_version: 3,
            upgrade_legacy_requests: true,
            force_debug_context: cfg!(debug_assertions),
        }
    }
}
