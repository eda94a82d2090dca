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

//! CPU-side storage of resources and texel manipulation helpers.

use prism_core::api::format::Format;
use prism_core::api::render::ClearFlags;
use prism_core::api::resource::{ResourceDesc, ResourceUsage, SubresourceBox};
use prism_core::error::ResourceError;
use std::ops::Range;

/// Backing memory of one resource plus the state shadowed from barriers.
#[derive(Debug)]
pub(crate) struct ResourceEntry {
    pub(crate) desc: ResourceDesc,
    pub(crate) memory: Box<[u8]>,
    /// Start of every subresource, followed by the total size.
    offsets: Vec<usize>,
    /// Last state declared through a barrier, used for hazard diagnostics only.
    pub(crate) state: ResourceUsage,
    pub(crate) debug_name: Option<String>,
}

impl ResourceEntry {
    /// Bytes needed to back every subresource of `desc`.
    pub(crate) fn allocation_size(desc: &ResourceDesc) -> u64 {
        (0..desc.subresource_count())
            .filter_map(|sub| desc.subresource_size(sub))
            .sum()
    }

    pub(crate) fn allocate(
        desc: ResourceDesc,
        initial_state: ResourceUsage,
    ) -> Result<Self, ResourceError> {
        let count = desc.subresource_count();
        let mut offsets = Vec::with_capacity(count as usize + 1);
        let mut total = 0usize;
        offsets.push(0);
        for sub in 0..count {
            let size = desc.subresource_size(sub).unwrap_or(0);
            total = usize::try_from(size)
                .ok()
                .and_then(|size| total.checked_add(size))
                .ok_or(ResourceError::OutOfMemory { requested: size })?;
            offsets.push(total);
        }
        Ok(Self {
            desc,
            memory: vec![0u8; total].into_boxed_slice(),
            offsets,
            state: initial_state,
            debug_name: None,
        })
    }

    pub(crate) fn subresource_range(&self, sub: u32) -> Option<Range<usize>> {
        let i = sub as usize;
        Some(*self.offsets.get(i)?..*self.offsets.get(i + 1)?)
    }

    pub(crate) fn extent(&self, sub: u32) -> (u32, u32, u32) {
        let (level, _) = self.desc.split_subresource(sub);
        self.desc.level_extent(level)
    }

    pub(crate) fn texel_size(&self) -> usize {
        self.desc.format.bytes_per_texel() as usize
    }

    /// Reads `region` of `sub` as tightly packed rows.
    pub(crate) fn read_region(&self, sub: u32, region: &SubresourceBox) -> Option<Vec<u8>> {
        let range = self.subresource_range(sub)?;
        let (w, h, _) = self.extent(sub);
        let bpp = self.texel_size();
        let row_bytes = region.width() as usize * bpp;
        let base = &self.memory[range];

        let mut out = Vec::with_capacity(row_bytes * (region.height() * region.depth()) as usize);
        for z in region.front..region.back {
            for y in region.top..region.bottom {
                let start = texel_offset(w, h, region.left, y, z) * bpp;
                out.extend_from_slice(base.get(start..start + row_bytes)?);
            }
        }
        Some(out)
    }

    /// Writes `data` into `region` of `sub`.
    ///
    /// Rows of `data` are `row_pitch` bytes apart and slices `slice_pitch`
    /// bytes apart; zero means tightly packed. Nothing is written when `data`
    /// is too short or the region falls outside the subresource.
    pub(crate) fn write_region(
        &mut self,
        sub: u32,
        region: &SubresourceBox,
        data: &[u8],
        row_pitch: usize,
        slice_pitch: usize,
    ) -> bool {
        let Some(range) = self.subresource_range(sub) else {
            return false;
        };
        let (w, h, d) = self.extent(sub);
        if !region.fits((w, h, d)) {
            return false;
        }
        let bpp = self.texel_size();
        let row_bytes = region.width() as usize * bpp;
        let row_pitch = if row_pitch == 0 { row_bytes } else { row_pitch };
        let slice_pitch = if slice_pitch == 0 {
            row_pitch * region.height() as usize
        } else {
            slice_pitch
        };
        let needed = (region.depth() as usize - 1) * slice_pitch
            + (region.height() as usize - 1) * row_pitch
            + row_bytes;
        if row_pitch < row_bytes || data.len() < needed {
            return false;
        }

        let base = &mut self.memory[range];
        for (zi, z) in (region.front..region.back).enumerate() {
            for (yi, y) in (region.top..region.bottom).enumerate() {
                let src = zi * slice_pitch + yi * row_pitch;
                let dst = texel_offset(w, h, region.left, y, z) * bpp;
                base[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
            }
        }
        true
    }

    /// Repeats `texel` over the whole subresource.
    pub(crate) fn fill(&mut self, sub: u32, texel: &[u8]) {
        if texel.is_empty() {
            return;
        }
        if let Some(range) = self.subresource_range(sub) {
            for chunk in self.memory[range].chunks_exact_mut(texel.len()) {
                chunk.copy_from_slice(texel);
            }
        }
    }
}

fn texel_offset(width: u32, height: u32, x: u32, y: u32, z: u32) -> usize {
    (z as usize * height as usize + y as usize) * width as usize + x as usize
}

/// The box a copy operates on: the caller's box when it fits, the whole
/// extent when none was given.
pub(crate) fn resolve_box(
    region: Option<&SubresourceBox>,
    extent: (u32, u32, u32),
) -> Option<SubresourceBox> {
    match region {
        Some(region) if region.fits(extent) => Some(*region),
        Some(_) => None,
        None => Some(SubresourceBox::covering(extent.0, extent.1, extent.2)),
    }
}

/// Point-samples packed texels from `src` dimensions to `dst` dimensions.
pub(crate) fn scale_nearest(
    src: &[u8],
    src_dims: (u32, u32, u32),
    dst_dims: (u32, u32, u32),
    bpp: usize,
) -> Vec<u8> {
    let (sw, sh, sd) = src_dims;
    let (dw, dh, dd) = dst_dims;
    let mut out = Vec::with_capacity((dw * dh * dd) as usize * bpp);
    for z in 0..dd {
        let sz = z * sd / dd;
        for y in 0..dh {
            let sy = y * sh / dh;
            for x in 0..dw {
                let sx = x * sw / dw;
                let at = texel_offset(sw, sh, sx, sy, sz) * bpp;
                out.extend_from_slice(&src[at..at + bpp]);
            }
        }
    }
    out
}

/// Builds the next mip level from packed texels of the previous one.
///
/// With `average` every byte is the mean of up to 2x2 source texels, which is
/// right for formats made of 8-bit unorm channels; otherwise the top-left texel
/// is kept.
pub(crate) fn downsample(
    src: &[u8],
    src_dims: (u32, u32, u32),
    dst_dims: (u32, u32, u32),
    bpp: usize,
    average: bool,
) -> Vec<u8> {
    let (sw, sh, sd) = src_dims;
    let (dw, dh, dd) = dst_dims;
    let mut out = Vec::with_capacity((dw * dh * dd) as usize * bpp);
    for z in 0..dd {
        let sz = (z * 2).min(sd - 1);
        for y in 0..dh {
            for x in 0..dw {
                let taps = [
                    ((x * 2).min(sw - 1), (y * 2).min(sh - 1)),
                    ((x * 2 + 1).min(sw - 1), (y * 2).min(sh - 1)),
                    ((x * 2).min(sw - 1), (y * 2 + 1).min(sh - 1)),
                    ((x * 2 + 1).min(sw - 1), (y * 2 + 1).min(sh - 1)),
                ];
                if !average {
                    let at = texel_offset(sw, sh, taps[0].0, taps[0].1, sz) * bpp;
                    out.extend_from_slice(&src[at..at + bpp]);
                    continue;
                }
                for byte in 0..bpp {
                    let sum: u32 = taps
                        .iter()
                        .map(|&(tx, ty)| u32::from(src[texel_offset(sw, sh, tx, ty, sz) * bpp + byte]))
                        .sum();
                    out.push(((sum + 2) / 4) as u8);
                }
            }
        }
    }
    out
}

/// `true` for formats whose channels are all 8-bit unorm values.
pub(crate) fn is_byte_unorm(format: Format) -> bool {
    matches!(
        format,
        Format::R8Unorm
            | Format::R8G8Unorm
            | Format::R8G8B8A8Typeless
            | Format::R8G8B8A8Unorm
            | Format::R8G8B8A8UnormSrgb
            | Format::B8G8R8A8Unorm
            | Format::B8G8R8A8UnormSrgb
    )
}

fn unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn f32_to_f16(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x007f_ffff;
    if exp == 0xff {
        return sign | 0x7c00 | if mantissa != 0 { 0x200 } else { 0 };
    }
    let half_exp = exp - 127 + 15;
    if half_exp >= 0x1f {
        return sign | 0x7c00;
    }
    if half_exp <= 0 {
        if half_exp < -10 {
            return sign;
        }
        return sign | ((mantissa | 0x0080_0000) >> (14 - half_exp)) as u16;
    }
    sign | ((half_exp as u16) << 10) | (mantissa >> 13) as u16
}

/// Encodes a float colour as one texel of `format`.
pub(crate) fn pack_color(format: Format, c: [f32; 4]) -> Option<Vec<u8>> {
    let floats = |n: usize| c[..n].iter().flat_map(|v| v.to_le_bytes()).collect();
    let halves = |n: usize| c[..n].iter().flat_map(|v| f32_to_f16(*v).to_le_bytes()).collect();
    Some(match format {
        Format::R8Unorm => vec![unorm8(c[0])],
        Format::R8G8Unorm => vec![unorm8(c[0]), unorm8(c[1])],
        Format::R8G8B8A8Typeless | Format::R8G8B8A8Unorm | Format::R8G8B8A8UnormSrgb => {
            c.iter().map(|v| unorm8(*v)).collect()
        }
        Format::B8G8R8A8Unorm | Format::B8G8R8A8UnormSrgb => {
            vec![unorm8(c[2]), unorm8(c[1]), unorm8(c[0]), unorm8(c[3])]
        }
        Format::R10G10B10A2Unorm => {
            let ten = |v: f32| (v.clamp(0.0, 1.0) * 1023.0).round() as u32;
            let two = (c[3].clamp(0.0, 1.0) * 3.0).round() as u32;
            (ten(c[0]) | ten(c[1]) << 10 | ten(c[2]) << 20 | two << 30)
                .to_le_bytes()
                .to_vec()
        }
        Format::R16Float => halves(1),
        Format::R16G16Float => halves(2),
        Format::R16G16B16A16Float => halves(4),
        Format::R32Typeless | Format::R32Float => floats(1),
        Format::R32G32Float => floats(2),
        Format::R32G32B32Float => floats(3),
        Format::R32G32B32A32Float => floats(4),
        Format::R32Uint => (c[0] as u32).to_le_bytes().to_vec(),
        Format::R32G32B32A32Uint => c.iter().flat_map(|v| (*v as u32).to_le_bytes()).collect(),
        _ => return None,
    })
}

/// Encodes raw integer clear values as one texel of `format`.
pub(crate) fn pack_uint(format: Format, v: [u32; 4]) -> Option<Vec<u8>> {
    Some(match format {
        Format::R8Unorm => vec![v[0] as u8],
        Format::R8G8Unorm => vec![v[0] as u8, v[1] as u8],
        Format::R8G8B8A8Typeless | Format::R8G8B8A8Unorm => v.iter().map(|x| *x as u8).collect(),
        Format::R32Typeless | Format::R32Uint | Format::R32Float => v[0].to_le_bytes().to_vec(),
        Format::R32G32Float => v[..2].iter().flat_map(|x| x.to_le_bytes()).collect(),
        Format::R32G32B32A32Uint | Format::R32G32B32A32Float => {
            v.iter().flat_map(|x| x.to_le_bytes()).collect()
        }
        _ => return None,
    })
}

/// Updates the depth and/or stencil part of one depth-stencil texel in place.
pub(crate) fn write_depth_stencil(
    texel: &mut [u8],
    format: Format,
    flags: ClearFlags,
    depth: f32,
    stencil: u8,
) -> bool {
    let depth = depth.clamp(0.0, 1.0);
    match format {
        Format::D16Unorm => {
            if flags.contains(ClearFlags::DEPTH) {
                texel[..2].copy_from_slice(&((depth * 65535.0).round() as u16).to_le_bytes());
            }
        }
        Format::D24UnormS8Uint | Format::R24G8Typeless => {
            let mut word = u32::from_le_bytes([texel[0], texel[1], texel[2], texel[3]]);
            if flags.contains(ClearFlags::DEPTH) {
                word = (word & 0xff00_0000) | (depth * 16_777_215.0).round() as u32;
            }
            if flags.contains(ClearFlags::STENCIL) {
                word = (word & 0x00ff_ffff) | u32::from(stencil) << 24;
            }
            texel[..4].copy_from_slice(&word.to_le_bytes());
        }
        Format::D32Float | Format::R32Typeless => {
            if flags.contains(ClearFlags::DEPTH) {
                texel[..4].copy_from_slice(&depth.to_le_bytes());
            }
        }
        Format::D32FloatS8Uint => {
            if flags.contains(ClearFlags::DEPTH) {
                texel[..4].copy_from_slice(&depth.to_le_bytes());
            }
            if flags.contains(ClearFlags::STENCIL) {
                texel[4] = stencil;
            }
        }
        _ => return false,
    }
    true
}
