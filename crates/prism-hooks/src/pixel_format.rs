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

//! `PIXELFORMATDESCRIPTOR` checks.

use prism_core::prism_bitflags;
use std::fmt;

prism_bitflags! {
    /// `PFD_*` flags of a pixel format descriptor.
    pub struct PixelFormatFlags: u32 {
        /// `PFD_DOUBLEBUFFER`
        const DOUBLE_BUFFER = 0x1;
        /// `PFD_STEREO`
        const STEREO = 0x2;
        /// `PFD_DRAW_TO_WINDOW`
        const DRAW_TO_WINDOW = 0x4;
        /// `PFD_DRAW_TO_BITMAP`
        const DRAW_TO_BITMAP = 0x8;
        /// `PFD_SUPPORT_GDI`
        const SUPPORT_GDI = 0x10;
        /// `PFD_SUPPORT_OPENGL`
        const SUPPORT_OPENGL = 0x20;
    }
}

/// `PFD_MAIN_PLANE`
pub const MAIN_PLANE: i8 = 0;

/// The fields of a `PIXELFORMATDESCRIPTOR` the hooks look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelFormatDescriptor {
    /// `dwFlags`
    pub flags: PixelFormatFlags,
    /// `cColorBits`
    pub color_bits: u8,
    /// `cDepthBits`
    pub depth_bits: u8,
    /// `cStencilBits`
    pub stencil_bits: u8,
    /// `iLayerType`
    pub layer_type: i8,
    /// `bReserved`, non-zero for overlay or underlay planes.
    pub reserved: u8,
}

impl PixelFormatDescriptor {
    /// A double-buffered RGBA window format.
    pub fn window(color_bits: u8, depth_bits: u8, stencil_bits: u8) -> Self {
        Self {
            flags: PixelFormatFlags::DOUBLE_BUFFER
                | PixelFormatFlags::DRAW_TO_WINDOW
                | PixelFormatFlags::SUPPORT_OPENGL,
            color_bits,
            depth_bits,
            stencil_bits,
            layer_type: MAIN_PLANE,
            reserved: 0,
        }
    }

    /// Rejects formats the runtime cannot present from.
    pub fn validate(&self) -> Result<(), PixelFormatError> {
        if self.layer_type != MAIN_PLANE || self.reserved != 0 {
            return Err(PixelFormatError::Layered {
                layer_type: self.layer_type,
                reserved: self.reserved,
            });
        }
        Ok(())
    }

    /// `true` when `PFD_DOUBLEBUFFER` is set.
    pub fn is_double_buffered(&self) -> bool {
        self.flags.contains(PixelFormatFlags::DOUBLE_BUFFER)
    }
}

/// A pixel format the hooks refuse to pass on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormatError {
    /// Overlay and underlay planes are not supported.
    Layered {
        /// `iLayerType` of the request.
        layer_type: i8,
        /// `bReserved` of the request.
        reserved: u8,
    },
}

impl fmt::Display for PixelFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormatError::Layered { layer_type, reserved } => write!(
                f,
                "Layered OpenGL contexts of type {layer_type} (reserved {reserved:#x}) are not supported"
            ),
        }
    }
}

impl std::error::Error for PixelFormatError {}
