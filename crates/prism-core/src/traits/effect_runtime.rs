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

use super::api_object::ApiObject;
use super::command_queue::CommandQueue;
use super::device::Device;
use crate::api::handle::ResourceViewHandle;
use crate::error::RuntimeError;

/// Values written into uniform variables by
/// [`EffectRuntime::update_uniform_variables`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValues<'a> {
    Bool(&'a [bool]),
    Float(&'a [f32]),
    Int(&'a [i32]),
    Uint(&'a [u32]),
}

impl UniformValues<'_> {
    /// Number of scalar values carried.
    pub fn len(&self) -> usize {
        match self {
            UniformValues::Bool(v) => v.len(),
            UniformValues::Float(v) => v.len(),
            UniformValues::Int(v) => v.len(),
            UniformValues::Uint(v) => v.len(),
        }
    }

    /// `true` when no value is carried.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The per-swap-chain façade that effect and addon logic drives.
///
/// A runtime owns a device reference and a command queue. The context registry
/// calls the lifecycle hooks: [`on_init`](Self::on_init) when the frame size
/// is known, [`on_reset`](Self::on_reset) before size-dependent resources must
/// go away, and [`on_present`](Self::on_present) once per presented frame.
pub trait EffectRuntime: ApiObject + Send {
    /// The device the runtime renders with.
    fn device(&self) -> &dyn Device;

    /// The queue the runtime submits to.
    fn get_command_queue(&mut self) -> &mut dyn CommandQueue;

    /// Current back buffer size; `(0, 0)` while uninitialised.
    fn get_frame_width_and_height(&self) -> (u32, u32);

    /// Binds `shader_resource_view` to every texture declared with `semantic`.
    fn update_texture_bindings(&mut self, semantic: &str, shader_resource_view: ResourceViewHandle);

    /// Writes `values` into every uniform variable whose `source` annotation
    /// equals `source`, starting at element `array_index`.
    fn update_uniform_variables(&mut self, source: &str, values: UniformValues<'_>, array_index: usize);

    /// Boolean overload of [`update_uniform_variables`](Self::update_uniform_variables).
    fn update_uniform_bools(&mut self, source: &str, values: &[bool], array_index: usize) {
        self.update_uniform_variables(source, UniformValues::Bool(values), array_index);
    }

    /// Float overload of [`update_uniform_variables`](Self::update_uniform_variables).
    fn update_uniform_floats(&mut self, source: &str, values: &[f32], array_index: usize) {
        self.update_uniform_variables(source, UniformValues::Float(values), array_index);
    }

    /// Signed integer overload of [`update_uniform_variables`](Self::update_uniform_variables).
    fn update_uniform_ints(&mut self, source: &str, values: &[i32], array_index: usize) {
        self.update_uniform_variables(source, UniformValues::Int(values), array_index);
    }

    /// Unsigned integer overload of [`update_uniform_variables`](Self::update_uniform_variables).
    fn update_uniform_uints(&mut self, source: &str, values: &[u32], array_index: usize) {
        self.update_uniform_variables(source, UniformValues::Uint(values), array_index);
    }

    /// Creates size-dependent resources for a `width` x `height` back buffer.
    fn on_init(&mut self, width: u32, height: u32) -> Result<(), RuntimeError>;

    /// Releases every size-dependent resource. Safe to call when uninitialised.
    fn on_reset(&mut self);

    /// Runs per-frame work right before the native present.
    fn on_present(&mut self);

    /// `true` between a successful `on_init` and the next `on_reset`.
    fn is_initialized(&self) -> bool;

    /// Marks the runtime as driving a legacy (compatibility profile) context.
    fn set_compatibility_context(&mut self, enabled: bool);
}
