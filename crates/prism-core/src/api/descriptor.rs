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

//! Descriptor binding shapes and descriptor values.

use super::handle::{DescriptorSetHandle, ResourceHandle, ResourceViewHandle, SamplerHandle};
use crate::prism_bitflags;

prism_bitflags! {
    /// Shader stages a binding is visible to.
    pub struct ShaderStage: u32 {
        /// Vertex stage.
        const VERTEX = 0x1;
        /// Hull (tessellation control) stage.
        const HULL = 0x2;
        /// Domain (tessellation evaluation) stage.
        const DOMAIN = 0x4;
        /// Geometry stage.
        const GEOMETRY = 0x8;
        /// Pixel (fragment) stage.
        const PIXEL = 0x10;
        /// Compute stage.
        const COMPUTE = 0x20;
        /// Every graphics stage.
        const ALL_GRAPHICS = 0x1f;
        /// Every stage.
        const ALL = 0x3f;
    }
}

/// Kind of object a descriptor slot holds.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Sampler,
    SamplerWithResourceView,
    ShaderResourceView,
    UnorderedAccessView,
    ConstantBuffer,
}

/// A contiguous range of descriptors of one type inside a set layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorRange {
    /// Binding index of the first descriptor.
    pub binding: u32,
    /// Register index for register-based APIs.
    pub dx_register_index: u32,
    /// Register space for register-based APIs.
    pub dx_register_space: u32,
    /// Number of descriptors in the range.
    pub count: u32,
    /// Stages that see the range.
    pub visibility: ShaderStage,
    /// Descriptor type shared by the whole range.
    pub descriptor_type: DescriptorType,
}

/// A range of 32-bit push constants in a pipeline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstantRange {
    /// Offset in 32-bit values from the start of the push constant block.
    pub offset: u32,
    /// Register index for register-based APIs.
    pub dx_register_index: u32,
    /// Register space for register-based APIs.
    pub dx_register_space: u32,
    /// Number of 32-bit values.
    pub count: u32,
    /// Stages that see the range.
    pub visibility: ShaderStage,
}

/// The value stored in one descriptor slot.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Descriptor {
    Sampler(SamplerHandle),
    SamplerWithResourceView {
        sampler: SamplerHandle,
        view: ResourceViewHandle,
    },
    ShaderResourceView(ResourceViewHandle),
    UnorderedAccessView(ResourceViewHandle),
    ConstantBuffer {
        buffer: ResourceHandle,
        offset: u64,
        /// Bytes visible to the shader, `u64::MAX` for the rest of the buffer.
        size: u64,
    },
}

impl Descriptor {
    /// The descriptor type this value belongs to.
    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            Descriptor::Sampler(_) => DescriptorType::Sampler,
            Descriptor::SamplerWithResourceView { .. } => DescriptorType::SamplerWithResourceView,
            Descriptor::ShaderResourceView(_) => DescriptorType::ShaderResourceView,
            Descriptor::UnorderedAccessView(_) => DescriptorType::UnorderedAccessView,
            Descriptor::ConstantBuffer { .. } => DescriptorType::ConstantBuffer,
        }
    }
}

/// One write in an `update_descriptor_sets` batch.
///
/// Writes `descriptors` into `set`, starting at slot `array_offset` of the range
/// declared at `binding`.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorUpdate<'a> {
    /// Set being written.
    pub set: DescriptorSetHandle,
    /// Binding index of the target range.
    pub binding: u32,
    /// First slot inside the range.
    pub array_offset: u32,
    /// New slot contents; all must share the range's descriptor type.
    pub descriptors: &'a [Descriptor],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_type_follows_the_value() {
        let cb = Descriptor::ConstantBuffer {
            buffer: ResourceHandle(1),
            offset: 0,
            size: u64::MAX,
        };
        assert_eq!(cb.descriptor_type(), DescriptorType::ConstantBuffer);
        assert_eq!(
            Descriptor::ShaderResourceView(ResourceViewHandle(2)).descriptor_type(),
            DescriptorType::ShaderResourceView
        );
    }

    #[test]
    fn graphics_stages_exclude_compute() {
        assert!(ShaderStage::ALL_GRAPHICS.contains(ShaderStage::PIXEL));
        assert!(!ShaderStage::ALL_GRAPHICS.intersects(ShaderStage::COMPUTE));
        assert!(ShaderStage::ALL.contains(ShaderStage::COMPUTE));
    }
}
