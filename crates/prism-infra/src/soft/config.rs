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

//! Configuration of a [`SoftDevice`](super::SoftDevice).

use prism_core::api::caps::{DeviceApi, DeviceCaps};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Limits and feature set of a software device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftDeviceConfig {
    /// The native API whose behaviour the device reports.
    pub api: DeviceApi,
    /// Capabilities the device exposes. `None` selects the preset of `api`.
    pub capabilities: Option<BTreeSet<DeviceCaps>>,
    /// Largest accepted texture width or height.
    pub max_texture_dimension: u32,
    /// Total bytes the device allocates before reporting out of memory.
    pub max_memory_bytes: u64,
}

impl Default for SoftDeviceConfig {
    fn default() -> Self {
        Self::for_api(DeviceApi::OpenGL)
    }
}

impl SoftDeviceConfig {
    /// Default limits with the capability preset of `api`.
    pub fn for_api(api: DeviceApi) -> Self {
        Self {
            api,
            capabilities: None,
            max_texture_dimension: 16384,
            max_memory_bytes: 1 << 30,
        }
    }

    /// The capability set this configuration resolves to.
    pub fn resolved_capabilities(&self) -> BTreeSet<DeviceCaps> {
        match &self.capabilities {
            Some(caps) => caps.clone(),
            None => capability_preset(self.api),
        }
    }
}

/// Capabilities the native API typically offers.
///
/// D3D9 has no compute, indirect or buffer-region copies; D3D10 adds geometry
/// shaders and buffer copies but still lacks compute and indirect; every later
/// API exposes the full set.
pub fn capability_preset(api: DeviceApi) -> BTreeSet<DeviceCaps> {
    use DeviceCaps::*;
    let caps: &[DeviceCaps] = match api {
        DeviceApi::D3D9 => &[
            IndependentBlend,
            DrawInstanced,
            FillModeNonSolid,
            PartialPushConstantUpdates,
            PartialPushDescriptorUpdates,
            SamplerAnisotropic,
            SamplerWithResourceView,
            Blit,
            ResolveRegion,
        ],
        DeviceApi::D3D10 => &[
            GeometryShader,
            DualSourceBlend,
            IndependentBlend,
            DrawInstanced,
            FillModeNonSolid,
            MultiViewport,
            PartialPushConstantUpdates,
            PartialPushDescriptorUpdates,
            SamplerCompare,
            SamplerAnisotropic,
            SamplerWithResourceView,
            CopyBufferRegion,
            CopyBufferToTexture,
            ResolveRegion,
        ],
        DeviceApi::D3D11 | DeviceApi::D3D12 | DeviceApi::OpenGL | DeviceApi::Vulkan => {
            &DeviceCaps::ALL
        }
    };
    caps.iter().copied().collect()
}
