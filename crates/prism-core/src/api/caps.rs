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

//! Native API identification and optional device capabilities.

use serde::{Deserialize, Serialize};

/// The native graphics API a device fronts.
///
/// The discriminants follow the major version of each API so they can be
/// compared and logged as raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum DeviceApi {
    /// Direct3D 9 (fixed-function era).
    D3D9 = 0x9000,
    /// Direct3D 10.
    D3D10 = 0xa000,
    /// Direct3D 11.
    D3D11 = 0xb000,
    /// Direct3D 12.
    D3D12 = 0xc000,
    /// OpenGL through WGL.
    OpenGL = 0x10000,
    /// Vulkan.
    Vulkan = 0x20000,
}

impl DeviceApi {
    /// `true` for the APIs with explicit barriers and descriptor sets.
    pub const fn is_explicit(self) -> bool {
        matches!(self, DeviceApi::D3D12 | DeviceApi::Vulkan)
    }
}

/// An optional feature a caller must check with `Device::check_capability`
/// before using the operations it gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum DeviceCaps {
    /// Compute pipelines and `dispatch`.
    ComputeShader = 1,
    /// Geometry shader stage.
    GeometryShader,
    /// Hull and domain shader stages.
    HullAndDomainShader,
    /// Dual-source blending.
    DualSourceBlend,
    /// Per-render-target blend state.
    IndependentBlend,
    /// Logic operations in the blend stage.
    LogicOp,
    /// Instanced draws.
    DrawInstanced,
    /// `draw_or_dispatch_indirect`.
    DrawOrDispatchIndirect,
    /// Wireframe and point fill modes.
    FillModeNonSolid,
    /// More than one viewport or scissor rectangle.
    MultiViewport,
    /// `push_constants` with a non-zero `first`.
    PartialPushConstantUpdates,
    /// `push_descriptors` with a non-zero `first`.
    PartialPushDescriptorUpdates,
    /// Comparison samplers.
    SamplerCompare,
    /// Anisotropic filtering.
    SamplerAnisotropic,
    /// Combined sampler/view descriptors.
    SamplerWithResourceView,
    /// `copy_buffer_region`.
    CopyBufferRegion,
    /// `copy_buffer_to_texture` and `copy_texture_to_buffer`.
    CopyBufferToTexture,
    /// Scaled `copy_texture_region`.
    Blit,
    /// `resolve_texture_region` with a sub-rectangle.
    ResolveRegion,
    /// `copy_query_results`.
    CopyQueryResults,
}

impl DeviceCaps {
    /// Every capability, in declaration order.
    pub const ALL: [DeviceCaps; 20] = [
        DeviceCaps::ComputeShader,
        DeviceCaps::GeometryShader,
        DeviceCaps::HullAndDomainShader,
        DeviceCaps::DualSourceBlend,
        DeviceCaps::IndependentBlend,
        DeviceCaps::LogicOp,
        DeviceCaps::DrawInstanced,
        DeviceCaps::DrawOrDispatchIndirect,
        DeviceCaps::FillModeNonSolid,
        DeviceCaps::MultiViewport,
        DeviceCaps::PartialPushConstantUpdates,
        DeviceCaps::PartialPushDescriptorUpdates,
        DeviceCaps::SamplerCompare,
        DeviceCaps::SamplerAnisotropic,
        DeviceCaps::SamplerWithResourceView,
        DeviceCaps::CopyBufferRegion,
        DeviceCaps::CopyBufferToTexture,
        DeviceCaps::Blit,
        DeviceCaps::ResolveRegion,
        DeviceCaps::CopyQueryResults,
    ];
}
