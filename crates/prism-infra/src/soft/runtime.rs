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

//! The software [`EffectRuntime`].

use super::device::SoftDevice;
use super::queue::SoftCommandQueue;
use super::uniforms::{UniformTable, UniformType};
use prism_core::api::format::Format;
use prism_core::api::handle::{ResourceHandle, ResourceViewHandle};
use prism_core::api::resource::{MemoryHeap, ResourceDesc, ResourceUsage, ResourceViewDesc};
use prism_core::api::user_data::UserDataSlots;
use prism_core::error::{ResourceError, RuntimeError};
use prism_core::event::EventBus;
use prism_core::traits::{ApiObject, CommandQueue, Device, EffectRuntime, UniformValues};
use std::collections::HashMap;

/// Semantic under which the back-buffer copy is bound.
pub const BACK_BUFFER_SEMANTIC: &str = "COLOR";

/// Lifecycle notifications published by a [`SoftEffectRuntime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// Size-dependent resources were created.
    Initialized {
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
    },
    /// Size-dependent resources were released.
    Reset,
    /// A frame was presented.
    Presented {
        /// Frames presented so far, this one included.
        frame: u64,
    },
}

#[derive(Debug, Clone, Copy)]
struct BackBuffer {
    texture: ResourceHandle,
    rtv: ResourceViewHandle,
    srv: ResourceViewHandle,
}

/// Effect runtime over a [`SoftDevice`], one per tracked context.
#[derive(Debug)]
pub struct SoftEffectRuntime {
    device: SoftDevice,
    queue: SoftCommandQueue,
    width: u32,
    height: u32,
    compatibility: bool,
    back_buffer: Option<BackBuffer>,
    texture_bindings: HashMap<String, ResourceViewHandle>,
    uniforms: UniformTable,
    events: EventBus<RuntimeEvent>,
    frame_count: u64,
    id: u64,
    user_data: UserDataSlots,
}

impl SoftEffectRuntime {
    /// Creates an uninitialised runtime; the frame size stays 0x0 until
    /// [`EffectRuntime::on_init`].
    pub fn new(device: SoftDevice) -> Self {
        let mut uniforms = UniformTable::default();
        uniforms.declare("framecount", Some("framecount"), UniformType::Uint, 1);
        Self {
            queue: SoftCommandQueue::new(device.clone()),
            id: device.next_handle(),
            device,
            width: 0,
            height: 0,
            compatibility: false,
            back_buffer: None,
            texture_bindings: HashMap::new(),
            uniforms,
            events: EventBus::new(),
            frame_count: 0,
            user_data: UserDataSlots::new(),
        }
    }

    /// The concrete device behind this runtime.
    pub fn soft_device(&self) -> &SoftDevice {
        &self.device
    }

    /// Lifecycle events; subscribe through [`EventBus::receiver`].
    pub fn events(&self) -> &EventBus<RuntimeEvent> {
        &self.events
    }

    /// Frames presented since creation.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// `true` when the runtime serves a legacy context.
    pub fn is_compatibility_context(&self) -> bool {
        self.compatibility
    }

    /// Back-buffer copy texture, [`ResourceHandle::NONE`] while uninitialised.
    pub fn back_buffer(&self) -> ResourceHandle {
        self.back_buffer.map_or(ResourceHandle::NONE, |b| b.texture)
    }

    /// View bound to `semantic`, if any.
    pub fn texture_binding(&self, semantic: &str) -> Option<ResourceViewHandle> {
        self.texture_bindings.get(semantic).copied()
    }

    /// Declares a uniform variable that `update_uniform_*` calls with a
    /// matching `source` will write to.
    pub fn declare_uniform(
        &mut self,
        name: &str,
        source: Option<&str>,
        base_type: UniformType,
        elements: usize,
    ) {
        self.uniforms.declare(name, source, base_type, elements);
    }

    /// Raw 32-bit contents of a uniform variable.
    pub fn uniform_data(&self, name: &str) -> Option<Vec<u32>> {
        self.uniforms.get(name).map(|v| v.data.clone())
    }

    /// Contents of a uniform variable read as floats.
    pub fn uniform_floats(&self, name: &str) -> Option<Vec<f32>> {
        self.uniforms.get(name).map(|v| v.as_floats())
    }

    /// Number of declared uniform variables.
    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }

    fn create_back_buffer(&self, width: u32, height: u32) -> Result<BackBuffer, ResourceError> {
        let desc = ResourceDesc::texture_2d(
            width,
            height,
            1,
            1,
            Format::R8G8B8A8Unorm,
            MemoryHeap::GpuOnly,
            ResourceUsage::RENDER_TARGET
                | ResourceUsage::SHADER_RESOURCE
                | ResourceUsage::COPY_DEST
                | ResourceUsage::COPY_SOURCE,
        );
        let texture = self
            .device
            .create_resource(&desc, None, ResourceUsage::SHADER_RESOURCE)?;
        let whole = ResourceViewDesc::texture_2d(Format::Unknown);
        let rtv = match self
            .device
            .create_resource_view(texture, ResourceUsage::RENDER_TARGET, &whole)
        {
            Ok(rtv) => rtv,
            Err(e) => {
                self.device.destroy_resource(texture);
                return Err(e);
            }
        };
        let srv = match self
            .device
            .create_resource_view(texture, ResourceUsage::SHADER_RESOURCE, &whole)
        {
            Ok(srv) => srv,
            Err(e) => {
                self.device.destroy_resource_view(rtv);
                self.device.destroy_resource(texture);
                return Err(e);
            }
        };
        self.device.set_debug_name(texture, "Back buffer copy");
        Ok(BackBuffer { texture, rtv, srv })
    }
}

impl ApiObject for SoftEffectRuntime {
    fn native_object(&self) -> u64 {
        self.id
    }

    fn user_data(&self) -> &UserDataSlots {
        &self.user_data
    }
}

impl EffectRuntime for SoftEffectRuntime {
    fn device(&self) -> &dyn Device {
        &self.device
    }

    fn get_command_queue(&mut self) -> &mut dyn CommandQueue {
        &mut self.queue
    }

    fn get_frame_width_and_height(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn update_texture_bindings(&mut self, semantic: &str, shader_resource_view: ResourceViewHandle) {
        if shader_resource_view.is_none() {
            self.texture_bindings.remove(semantic);
        } else {
            self.texture_bindings
                .insert(semantic.to_owned(), shader_resource_view);
        }
        log::debug!("SoftEffectRuntime: Bound {shader_resource_view:?} to semantic '{semantic}'");
    }

    fn update_uniform_variables(&mut self, source: &str, values: UniformValues<'_>, array_index: usize) {
        if self.uniforms.update(source, values, array_index) == 0 {
            log::trace!("SoftEffectRuntime: No uniform variable uses source '{source}'");
        }
    }

    fn on_init(&mut self, width: u32, height: u32) -> Result<(), RuntimeError> {
        if self.is_initialized() {
            self.on_reset();
        }
        let fail = |source| RuntimeError::InitializationFailed {
            width,
            height,
            source,
        };
        if width == 0 || height == 0 {
            return Err(fail(ResourceError::InvalidDescription(
                "frame has no area".into(),
            )));
        }
        let back_buffer = self.create_back_buffer(width, height).map_err(fail)?;

        let list = self.queue.get_immediate_command_list();
        list.barrier_one(
            back_buffer.texture,
            ResourceUsage::SHADER_RESOURCE,
            ResourceUsage::RENDER_TARGET,
        );
        list.clear_render_target_view(back_buffer.rtv, [0.0, 0.0, 0.0, 0.0]);
        list.barrier_one(
            back_buffer.texture,
            ResourceUsage::RENDER_TARGET,
            ResourceUsage::SHADER_RESOURCE,
        );

        self.texture_bindings
            .insert(BACK_BUFFER_SEMANTIC.to_owned(), back_buffer.srv);
        self.back_buffer = Some(back_buffer);
        self.width = width;
        self.height = height;
        log::info!("SoftEffectRuntime: Initialized at {width}x{height}");
        self.events.publish(RuntimeEvent::Initialized { width, height });
        Ok(())
    }

    fn on_reset(&mut self) {
        let Some(back_buffer) = self.back_buffer.take() else {
            return;
        };
        self.queue.wait_idle();
        self.texture_bindings.retain(|_, view| *view != back_buffer.srv);
        self.device.destroy_resource_view(back_buffer.srv);
        self.device.destroy_resource_view(back_buffer.rtv);
        self.device.destroy_resource(back_buffer.texture);
        self.width = 0;
        self.height = 0;
        log::info!("SoftEffectRuntime: Reset");
        self.events.publish(RuntimeEvent::Reset);
    }

    fn on_present(&mut self) {
        if !self.is_initialized() {
            log::warn!("SoftEffectRuntime: Present before initialization ignored");
            return;
        }
        self.frame_count += 1;
        let frame = self.frame_count;
        self.update_uniform_uints("framecount", &[frame as u32], 0);
        self.queue.flush_immediate_command_list();
        // Presentation is where the software device completes queued work.
        Device::wait_idle(&self.device);
        self.events.publish(RuntimeEvent::Presented { frame });
    }

    fn is_initialized(&self) -> bool {
        self.back_buffer.is_some()
    }

    fn set_compatibility_context(&mut self, enabled: bool) {
        self.compatibility = enabled;
        log::debug!("SoftEffectRuntime: Compatibility context {enabled}");
    }
}

impl Drop for SoftEffectRuntime {
    fn drop(&mut self) {
        self.on_reset();
    }
}
