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

//! Buffers, textures, their views, samplers and CPU mapping.

use super::format::Format;
use super::pipeline::CompareOp;
use crate::prism_bitflags;
use serde::{Deserialize, Serialize};
use std::ptr::NonNull;

prism_bitflags! {
    /// How a resource may be used, and which state it is in for a barrier.
    ///
    /// The same type serves both purposes: creation takes the set of allowed
    /// usages, and `CommandList::barrier` takes the old and new access state.
    /// The abstraction never tracks the current state on the caller's behalf.
    pub struct ResourceUsage: u32 {
        /// Bound through `bind_index_buffer`.
        const INDEX_BUFFER = 0x1;
        /// Bound through `bind_vertex_buffers`.
        const VERTEX_BUFFER = 0x2;
        /// Bound as a constant buffer descriptor.
        const CONSTANT_BUFFER = 0x4;
        /// Source of indirect draw or dispatch arguments.
        const INDIRECT_ARGUMENT = 0x8;
        /// Depth-stencil attachment, read only.
        const DEPTH_STENCIL_READ = 0x10;
        /// Depth-stencil attachment, writable.
        const DEPTH_STENCIL_WRITE = 0x20;
        /// Either depth-stencil access.
        const DEPTH_STENCIL = 0x30;
        /// Colour attachment.
        const RENDER_TARGET = 0x40;
        /// Sampled or read in a shader.
        const SHADER_RESOURCE = 0x80;
        /// Read and written from shaders.
        const UNORDERED_ACCESS = 0x100;
        /// Destination of a copy.
        const COPY_DEST = 0x200;
        /// Source of a copy.
        const COPY_SOURCE = 0x400;
        /// Destination of a multisample resolve.
        const RESOLVE_DEST = 0x800;
        /// Source of a multisample resolve.
        const RESOLVE_SOURCE = 0x1000;
        /// Ready for presentation.
        const PRESENT = 0x2000;
        /// Accessed by the CPU through mapping.
        const CPU_ACCESS = 0x4000;
    }
}

/// Dimensionality of a resource.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceType {
    #[default]
    Buffer,
    Texture1D,
    Texture2D,
    Texture3D,
}

/// Memory the resource is allocated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MemoryHeap {
    /// Device local, invisible to the CPU.
    #[default]
    GpuOnly,
    /// Written by the CPU, read by the GPU.
    CpuToGpu,
    /// Written by the GPU, read back by the CPU.
    GpuToCpu,
    /// System memory.
    CpuOnly,
}

impl MemoryHeap {
    /// `true` when `Device::map_resource` may succeed for this heap.
    pub const fn is_cpu_visible(self) -> bool {
        !matches!(self, MemoryHeap::GpuOnly)
    }
}

/// Description of a buffer or texture.
///
/// For buffers `width` is the size in bytes and every texture field is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceDesc {
    /// Buffer or texture dimensionality.
    pub resource_type: ResourceType,
    /// Buffer size in bytes, or texture width in texels.
    pub width: u64,
    /// Texture height.
    pub height: u32,
    /// Depth for 3D textures, array layer count otherwise.
    pub depth_or_layers: u16,
    /// Number of mip levels.
    pub levels: u16,
    /// Texel format.
    pub format: Format,
    /// Sample count per texel.
    pub samples: u16,
    /// Heap the memory comes from.
    pub heap: MemoryHeap,
    /// Every usage the resource will ever be put to.
    pub usage: ResourceUsage,
}

impl ResourceDesc {
    /// A buffer of `size` bytes.
    pub fn buffer(size: u64, heap: MemoryHeap, usage: ResourceUsage) -> Self {
        Self {
            resource_type: ResourceType::Buffer,
            width: size,
            height: 1,
            depth_or_layers: 1,
            levels: 1,
            format: Format::Unknown,
            samples: 1,
            heap,
            usage,
        }
    }

    /// A single-sampled 2D texture (array when `layers > 1`).
    pub fn texture_2d(
        width: u32,
        height: u32,
        layers: u16,
        levels: u16,
        format: Format,
        heap: MemoryHeap,
        usage: ResourceUsage,
    ) -> Self {
        Self {
            resource_type: ResourceType::Texture2D,
            width: u64::from(width),
            height,
            depth_or_layers: layers,
            levels,
            format,
            samples: 1,
            heap,
            usage,
        }
    }

    /// A single-sampled 3D texture.
    pub fn texture_3d(
        width: u32,
        height: u32,
        depth: u16,
        levels: u16,
        format: Format,
        heap: MemoryHeap,
        usage: ResourceUsage,
    ) -> Self {
        Self {
            resource_type: ResourceType::Texture3D,
            depth_or_layers: depth,
            ..Self::texture_2d(width, height, 1, levels, format, heap, usage)
        }
    }

    /// `true` for buffers.
    pub fn is_buffer(&self) -> bool {
        self.resource_type == ResourceType::Buffer
    }

    /// Array layer count (1 for buffers and 3D textures).
    pub fn array_layers(&self) -> u32 {
        match self.resource_type {
            ResourceType::Buffer | ResourceType::Texture3D => 1,
            _ => u32::from(self.depth_or_layers.max(1)),
        }
    }

    /// Mip level count, never zero.
    pub fn mip_levels(&self) -> u32 {
        if self.is_buffer() {
            1
        } else {
            u32::from(self.levels.max(1))
        }
    }

    /// Number of addressable subresources.
    pub fn subresource_count(&self) -> u32 {
        self.mip_levels() * self.array_layers()
    }

    /// Splits a subresource index into `(level, layer)`.
    pub fn split_subresource(&self, subresource: u32) -> (u32, u32) {
        let levels = self.mip_levels();
        (subresource % levels, subresource / levels)
    }

    /// Extent in texels of mip `level` as `(width, height, depth)`.
    pub fn level_extent(&self, level: u32) -> (u32, u32, u32) {
        let shrink = |v: u32| (v >> level).max(1);
        let width = u32::try_from(self.width).unwrap_or(u32::MAX);
        match self.resource_type {
            ResourceType::Buffer => (width, 1, 1),
            ResourceType::Texture1D => (shrink(width), 1, 1),
            ResourceType::Texture2D => (shrink(width), shrink(self.height), 1),
            ResourceType::Texture3D => (
                shrink(width),
                shrink(self.height),
                shrink(u32::from(self.depth_or_layers)),
            ),
        }
    }

    /// Tightly packed row pitch of mip `level`, in bytes.
    pub fn row_pitch(&self, level: u32) -> u32 {
        self.level_extent(level).0 * self.format.bytes_per_texel()
    }

    /// Size in bytes of one subresource, or `None` when out of range.
    pub fn subresource_size(&self, subresource: u32) -> Option<u64> {
        if subresource >= self.subresource_count() {
            return None;
        }
        if self.is_buffer() {
            return Some(self.width);
        }
        let (level, _) = self.split_subresource(subresource);
        let (w, h, d) = self.level_extent(level);
        Some(u64::from(w) * u64::from(h) * u64::from(d) * u64::from(self.format.bytes_per_texel()))
    }
}

/// Which kind of view a [`ResourceViewDesc`] creates.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceViewType {
    #[default]
    Unknown,
    Buffer,
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture2DMultisample,
    Texture3D,
    TextureCube,
}

/// Range and interpretation of a resource view.
///
/// `u32::MAX` for `levels` or `layers` means "everything from the first one".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceViewDesc {
    /// View dimensionality.
    pub view_type: ResourceViewType,
    /// View format; [`Format::Unknown`] inherits the resource format.
    pub format: Format,
    /// First visible mip level.
    pub first_level: u32,
    /// Number of visible mip levels.
    pub levels: u32,
    /// First visible array layer.
    pub first_layer: u32,
    /// Number of visible array layers.
    pub layers: u32,
    /// Byte offset for buffer views.
    pub buffer_offset: u64,
    /// Byte size for buffer views, `u64::MAX` for the rest of the buffer.
    pub buffer_size: u64,
}

impl ResourceViewDesc {
    /// A view of an entire 2D texture with the resource's own format.
    pub fn texture_2d(format: Format) -> Self {
        Self {
            view_type: ResourceViewType::Texture2D,
            format,
            first_level: 0,
            levels: u32::MAX,
            first_layer: 0,
            layers: u32::MAX,
            buffer_offset: 0,
            buffer_size: 0,
        }
    }

    /// A view of a single mip level of a 2D texture.
    pub fn texture_2d_level(format: Format, level: u32) -> Self {
        Self {
            first_level: level,
            levels: 1,
            ..Self::texture_2d(format)
        }
    }

    /// A typed window onto a buffer.
    pub fn buffer(format: Format, offset: u64, size: u64) -> Self {
        Self {
            view_type: ResourceViewType::Buffer,
            format,
            first_level: 0,
            levels: 1,
            first_layer: 0,
            layers: 1,
            buffer_offset: offset,
            buffer_size: size,
        }
    }
}

/// Texture filtering mode of a sampler or a blit.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFilter {
    MinMagMipPoint,
    MinMagPointMipLinear,
    MinMagLinearMipPoint,
    #[default]
    MinMagMipLinear,
    Anisotropic,
    CompareMinMagMipPoint,
    CompareMinMagMipLinear,
    CompareAnisotropic,
}

impl TextureFilter {
    /// `true` for comparison filters.
    pub const fn is_compare(self) -> bool {
        matches!(
            self,
            TextureFilter::CompareMinMagMipPoint
                | TextureFilter::CompareMinMagMipLinear
                | TextureFilter::CompareAnisotropic
        )
    }

    /// `true` for anisotropic filters.
    pub const fn is_anisotropic(self) -> bool {
        matches!(
            self,
            TextureFilter::Anisotropic | TextureFilter::CompareAnisotropic
        )
    }
}

/// Texture coordinate wrapping.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureAddressMode {
    Wrap,
    Mirror,
    #[default]
    Clamp,
    Border,
    MirrorOnce,
}

/// Description of a sampler state object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    /// Minification, magnification and mip filter.
    pub filter: TextureFilter,
    /// Addressing along U.
    pub address_u: TextureAddressMode,
    /// Addressing along V.
    pub address_v: TextureAddressMode,
    /// Addressing along W.
    pub address_w: TextureAddressMode,
    /// Bias added to the computed mip level.
    pub mip_lod_bias: f32,
    /// Maximum anisotropy, between 1 and 16.
    pub max_anisotropy: f32,
    /// Comparison function for comparison filters.
    pub compare_op: CompareOp,
    /// Colour used by [`TextureAddressMode::Border`].
    pub border_color: [f32; 4],
    /// Lowest accessible mip level.
    pub min_lod: f32,
    /// Highest accessible mip level.
    pub max_lod: f32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            filter: TextureFilter::MinMagMipLinear,
            address_u: TextureAddressMode::Clamp,
            address_v: TextureAddressMode::Clamp,
            address_w: TextureAddressMode::Clamp,
            mip_lod_bias: 0.0,
            max_anisotropy: 1.0,
            compare_op: CompareOp::Always,
            border_color: [0.0; 4],
            min_lod: -f32::MAX,
            max_lod: f32::MAX,
        }
    }
}

/// Initial or uploaded contents of one subresource.
#[derive(Debug, Clone, Copy)]
pub struct SubresourceData<'a> {
    /// Texel or byte data.
    pub data: &'a [u8],
    /// Bytes between two rows.
    pub row_pitch: u32,
    /// Bytes between two depth slices.
    pub slice_pitch: u32,
}

impl<'a> SubresourceData<'a> {
    /// Wraps bytes whose rows are tightly packed.
    pub fn packed(data: &'a [u8], row_pitch: u32, slice_pitch: u32) -> Self {
        Self {
            data,
            row_pitch,
            slice_pitch,
        }
    }
}

/// A 3D region of a subresource, half-open on the right/bottom/back sides.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubresourceBox {
    pub left: u32,
    pub top: u32,
    pub front: u32,
    pub right: u32,
    pub bottom: u32,
    pub back: u32,
}

impl SubresourceBox {
    /// The box covering a whole `width` x `height` x `depth` extent.
    pub fn covering(width: u32, height: u32, depth: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            front: 0,
            right: width,
            bottom: height,
            back: depth,
        }
    }

    /// Width of the box in texels.
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    /// Height of the box in texels.
    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Depth of the box in texels.
    pub fn depth(&self) -> u32 {
        self.back.saturating_sub(self.front)
    }

    /// `true` when the box fits inside the given extent and is not empty.
    pub fn fits(&self, extent: (u32, u32, u32)) -> bool {
        self.width() > 0
            && self.height() > 0
            && self.depth() > 0
            && self.right <= extent.0
            && self.bottom <= extent.1
            && self.back <= extent.2
    }
}

/// CPU access requested when mapping a subresource.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
    /// Write, discarding the previous contents.
    WriteDiscard,
}

/// A CPU pointer to a mapped subresource.
///
/// The pointer stays valid until the matching `Device::unmap_resource` or the
/// destruction of the resource, whichever comes first.
#[derive(Debug, Clone, Copy)]
pub struct MappedSubresource {
    /// Start of the mapped memory.
    pub data: NonNull<u8>,
    /// Size of the mapped memory in bytes.
    pub size: usize,
    /// Bytes between two rows.
    pub row_pitch: u32,
    /// Bytes between two depth slices.
    pub slice_pitch: u32,
}

impl MappedSubresource {
    /// Views the mapping as a byte slice.
    ///
    /// # Safety
    /// The subresource must still be mapped, and nothing may write to it for
    /// the lifetime `'a`.
    pub unsafe fn as_slice<'a>(&self) -> &'a [u8] {
        std::slice::from_raw_parts(self.data.as_ptr(), self.size)
    }

    /// Views the mapping as a mutable byte slice.
    ///
    /// # Safety
    /// The subresource must still be mapped, and no other reference to it may
    /// exist for the lifetime `'a`.
    pub unsafe fn as_mut_slice<'a>(&self) -> &'a mut [u8] {
        std::slice::from_raw_parts_mut(self.data.as_ptr(), self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subresources_are_ordered_level_major_within_layer() {
        let desc = ResourceDesc::texture_2d(
            64,
            32,
            2,
            3,
            Format::R8G8B8A8Unorm,
            MemoryHeap::GpuOnly,
            ResourceUsage::SHADER_RESOURCE,
        );
        assert_eq!(desc.subresource_count(), 6);
        assert_eq!(desc.split_subresource(4), (1, 1));
        assert_eq!(desc.level_extent(2), (16, 8, 1));
        assert_eq!(desc.subresource_size(0), Some(64 * 32 * 4));
        assert_eq!(desc.subresource_size(5), Some(16 * 8 * 4));
        assert_eq!(desc.subresource_size(6), None);
    }

    #[test]
    fn buffer_has_one_subresource_of_its_size() {
        let desc = ResourceDesc::buffer(256, MemoryHeap::CpuToGpu, ResourceUsage::VERTEX_BUFFER);
        assert!(desc.is_buffer());
        assert_eq!(desc.subresource_count(), 1);
        assert_eq!(desc.subresource_size(0), Some(256));
    }

    #[test]
    fn depth_stencil_usage_covers_read_and_write() {
        assert!(ResourceUsage::DEPTH_STENCIL.contains(ResourceUsage::DEPTH_STENCIL_READ));
        assert!(ResourceUsage::DEPTH_STENCIL.contains(ResourceUsage::DEPTH_STENCIL_WRITE));
        assert!(!ResourceUsage::DEPTH_STENCIL.intersects(ResourceUsage::RENDER_TARGET));
    }

    #[test]
    fn box_fit_checks_bounds_and_emptiness() {
        let full = SubresourceBox::covering(4, 4, 1);
        assert!(full.fits((4, 4, 1)));
        assert!(!full.fits((3, 4, 1)));
        assert!(!SubresourceBox::default().fits((4, 4, 1)));
    }
}
