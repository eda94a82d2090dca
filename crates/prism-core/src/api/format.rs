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

//! Pixel and element formats.

use serde::{Deserialize, Serialize};

/// Element format of a texture, view or vertex attribute.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    #[default]
    Unknown,
    R8Unorm,
    R8G8Unorm,
    R8G8B8A8Typeless,
    R8G8B8A8Unorm,
    R8G8B8A8UnormSrgb,
    B8G8R8A8Unorm,
    B8G8R8A8UnormSrgb,
    R10G10B10A2Unorm,
    R16Float,
    R16G16Float,
    R16G16B16A16Float,
    R32Typeless,
    R32Float,
    R32Uint,
    R32G32Float,
    R32G32B32Float,
    R32G32B32A32Float,
    R32G32B32A32Uint,
    R24G8Typeless,
    D16Unorm,
    D24UnormS8Uint,
    D32Float,
    D32FloatS8Uint,
}

impl Format {
    /// Size in bytes of one texel, or zero for [`Format::Unknown`].
    pub const fn bytes_per_texel(self) -> u32 {
        match self {
            Format::Unknown => 0,
            Format::R8Unorm => 1,
            Format::R8G8Unorm | Format::R16Float | Format::D16Unorm => 2,
            Format::R8G8B8A8Typeless
            | Format::R8G8B8A8Unorm
            | Format::R8G8B8A8UnormSrgb
            | Format::B8G8R8A8Unorm
            | Format::B8G8R8A8UnormSrgb
            | Format::R10G10B10A2Unorm
            | Format::R16G16Float
            | Format::R32Typeless
            | Format::R32Float
            | Format::R32Uint
            | Format::R24G8Typeless
            | Format::D24UnormS8Uint
            | Format::D32Float => 4,
            Format::R16G16B16A16Float | Format::R32G32Float | Format::D32FloatS8Uint => 8,
            Format::R32G32B32Float => 12,
            Format::R32G32B32A32Float | Format::R32G32B32A32Uint => 16,
        }
    }

    /// `true` for formats usable as a depth-stencil attachment.
    pub const fn is_depth_stencil(self) -> bool {
        matches!(
            self,
            Format::D16Unorm | Format::D24UnormS8Uint | Format::D32Float | Format::D32FloatS8Uint
        )
    }

    /// `true` when the format carries a stencil component.
    pub const fn has_stencil(self) -> bool {
        matches!(self, Format::D24UnormS8Uint | Format::D32FloatS8Uint)
    }

    /// `true` for sRGB-encoded colour formats.
    pub const fn is_srgb(self) -> bool {
        matches!(self, Format::R8G8B8A8UnormSrgb | Format::B8G8R8A8UnormSrgb)
    }

    /// `true` for formats whose interpretation is left to the views.
    pub const fn is_typeless(self) -> bool {
        matches!(
            self,
            Format::R8G8B8A8Typeless | Format::R32Typeless | Format::R24G8Typeless
        )
    }

    /// `true` for unsigned integer formats, which only accept integer clears.
    pub const fn is_integer(self) -> bool {
        matches!(self, Format::R32Uint | Format::R32G32B32A32Uint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texel_sizes() {
        assert_eq!(Format::Unknown.bytes_per_texel(), 0);
        assert_eq!(Format::R8G8B8A8Unorm.bytes_per_texel(), 4);
        assert_eq!(Format::R16G16B16A16Float.bytes_per_texel(), 8);
        assert_eq!(Format::R32G32B32A32Float.bytes_per_texel(), 16);
    }

    #[test]
    fn classification() {
        assert!(Format::D24UnormS8Uint.is_depth_stencil());
        assert!(Format::D24UnormS8Uint.has_stencil());
        assert!(!Format::D32Float.has_stencil());
        assert!(Format::B8G8R8A8UnormSrgb.is_srgb());
        assert!(!Format::R8G8B8A8Unorm.is_depth_stencil());
    }
}
