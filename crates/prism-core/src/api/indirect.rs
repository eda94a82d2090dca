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

//! Indirect draw and dispatch argument layouts.
//!
//! The argument structs mirror the native indirect-buffer layouts bit for bit,
//! so they can be written into a buffer with `bytemuck` and read back by any
//! backend.

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Selects how an indirect argument buffer is interpreted.
///
/// The discriminants are the small integer tags native callers pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum IndirectCommand {
    /// Non-indexed draw, reads [`DrawIndirectArgs`].
    Draw = 1,
    /// Indexed draw, reads [`DrawIndexedIndirectArgs`].
    DrawIndexed = 2,
    /// Compute dispatch, reads [`DispatchIndirectArgs`].
    Dispatch = 3,
}

impl IndirectCommand {
    /// Size in bytes of one argument record.
    pub const fn argument_size(self) -> u32 {
        match self {
            IndirectCommand::Draw => std::mem::size_of::<DrawIndirectArgs>() as u32,
            IndirectCommand::DrawIndexed => std::mem::size_of::<DrawIndexedIndirectArgs>() as u32,
            IndirectCommand::Dispatch => std::mem::size_of::<DispatchIndirectArgs>() as u32,
        }
    }
}

/// A tag that names no [`IndirectCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownIndirectCommand(pub u32);

impl fmt::Display for UnknownIndirectCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown indirect command tag {}", self.0)
    }
}

impl std::error::Error for UnknownIndirectCommand {}

impl TryFrom<u32> for IndirectCommand {
    type Error = UnknownIndirectCommand;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(IndirectCommand::Draw),
            2 => Ok(IndirectCommand::DrawIndexed),
            3 => Ok(IndirectCommand::Dispatch),
            other => Err(UnknownIndirectCommand(other)),
        }
    }
}

/// Arguments of one non-indexed indirect draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[allow(missing_docs)]
pub struct DrawIndirectArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

/// Arguments of one indexed indirect draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[allow(missing_docs)]
pub struct DrawIndexedIndirectArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub first_instance: u32,
}

/// Arguments of one indirect dispatch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
#[allow(missing_docs)]
pub struct DispatchIndirectArgs {
    pub group_count_x: u32,
    pub group_count_y: u32,
    pub group_count_z: u32,
}
