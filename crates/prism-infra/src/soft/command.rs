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

//! Command recording for the software backend.

use super::device::SoftDevice;
use prism_core::api::descriptor::{Descriptor, ShaderStage};
use prism_core::api::format::Format;
use prism_core::api::handle::*;
use prism_core::api::indirect::IndirectCommand;
use prism_core::api::pipeline::{PipelineState, PipelineType};
use prism_core::api::query::QueryType;
use prism_core::api::render::{ClearFlags, Rect, Viewport};
use prism_core::api::resource::{ResourceUsage, SubresourceBox, TextureFilter};
use prism_core::api::user_data::UserDataSlots;
use prism_core::traits::{ApiObject, CommandList, Device};
use std::any::Any;

/// One recorded command, owning copies of every argument.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Barrier {
        resources: Vec<ResourceHandle>,
        old_states: Vec<ResourceUsage>,
        new_states: Vec<ResourceUsage>,
    },
    BindPipeline {
        pipeline_type: PipelineType,
        pipeline: PipelineHandle,
    },
    BindPipelineStates(Vec<(PipelineState, u32)>),
    BindViewports {
        first: u32,
        viewports: Vec<Viewport>,
    },
    BindScissorRects {
        first: u32,
        rects: Vec<Rect>,
    },
    PushConstants {
        stages: ShaderStage,
        layout: PipelineLayoutHandle,
        layout_param: u32,
        first: u32,
        values: Vec<u32>,
    },
    PushDescriptors {
        stages: ShaderStage,
        layout: PipelineLayoutHandle,
        layout_param: u32,
        first: u32,
        descriptors: Vec<Descriptor>,
    },
    BindDescriptorSets {
        pipeline_type: PipelineType,
        layout: PipelineLayoutHandle,
        first: u32,
        sets: Vec<DescriptorSetHandle>,
    },
    BindIndexBuffer {
        buffer: ResourceHandle,
        offset: u64,
        index_size: u32,
    },
    BindVertexBuffers {
        first: u32,
        buffers: Vec<ResourceHandle>,
        offsets: Vec<u64>,
        strides: Vec<u32>,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
    DrawOrDispatchIndirect {
        command: IndirectCommand,
        buffer: ResourceHandle,
        offset: u64,
        draw_count: u32,
        stride: u32,
    },
    BeginRenderPass {
        rtvs: Vec<ResourceViewHandle>,
        dsv: ResourceViewHandle,
    },
    FinishRenderPass,
    CopyResource {
        source: ResourceHandle,
        destination: ResourceHandle,
    },
    CopyBufferRegion {
        source: ResourceHandle,
        source_offset: u64,
        destination: ResourceHandle,
        destination_offset: u64,
        size: u64,
    },
    CopyBufferToTexture {
        source: ResourceHandle,
        source_offset: u64,
        row_length: u32,
        slice_height: u32,
        destination: ResourceHandle,
        destination_subresource: u32,
        destination_box: Option<SubresourceBox>,
    },
    CopyTextureRegion {
        source: ResourceHandle,
        source_subresource: u32,
        source_box: Option<SubresourceBox>,
        destination: ResourceHandle,
        destination_subresource: u32,
        destination_box: Option<SubresourceBox>,
        filter: TextureFilter,
    },
    CopyTextureToBuffer {
        source: ResourceHandle,
        source_subresource: u32,
        source_box: Option<SubresourceBox>,
        destination: ResourceHandle,
        destination_offset: u64,
        row_length: u32,
        slice_height: u32,
    },
    ResolveTextureRegion {
        source: ResourceHandle,
        source_subresource: u32,
        source_box: Option<SubresourceBox>,
        destination: ResourceHandle,
        destination_subresource: u32,
        destination_offset: [u32; 3],
        format: Format,
    },
    GenerateMipmaps(ResourceViewHandle),
    ClearDepthStencilView {
        dsv: ResourceViewHandle,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    },
    ClearRenderTargetViews {
        rtvs: Vec<ResourceViewHandle>,
        color: [f32; 4],
    },
    ClearUnorderedAccessViewUint {
        uav: ResourceViewHandle,
        values: [u32; 4],
    },
    ClearUnorderedAccessViewFloat {
        uav: ResourceViewHandle,
        values: [f32; 4],
    },
    BeginQuery {
        pool: QueryPoolHandle,
        query_type: QueryType,
        index: u32,
    },
    FinishQuery {
        pool: QueryPoolHandle,
        query_type: QueryType,
        index: u32,
    },
    CopyQueryResults {
        pool: QueryPoolHandle,
        query_type: QueryType,
        first: u32,
        count: u32,
        destination: ResourceHandle,
        destination_offset: u64,
        stride: u32,
    },
    AddDebugMarker {
        label: String,
        color: [f32; 4],
    },
    BeginDebugMarker {
        label: String,
        color: [f32; 4],
    },
    FinishDebugMarker,
}

/// Recording state of a [`SoftCommandList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// Commands are being appended.
    Recording,
    /// The list was submitted; [`SoftCommandList::reset`] reopens it.
    Closed,
}

/// A command list that records into an in-memory [`Command`] stream.
///
/// Misuse (nested render passes, recording after submission, mismatched
/// barrier slices) is rejected: the command is dropped, a warning is logged
/// and [`violation_count`](Self::violation_count) grows.
#[derive(Debug)]
pub struct SoftCommandList {
    device: SoftDevice,
    commands: Vec<Command>,
    state: ListState,
    in_render_pass: bool,
    marker_depth: u32,
    violations: u32,
    id: u64,
    user_data: UserDataSlots,
}

impl SoftCommandList {
    /// Creates an empty list recording for `device`.
    pub fn new(device: SoftDevice) -> Self {
        let id = device.next_handle();
        Self {
            device,
            commands: Vec::new(),
            state: ListState::Recording,
            in_render_pass: false,
            marker_depth: 0,
            violations: 0,
            id,
            user_data: UserDataSlots::new(),
        }
    }

    /// Commands recorded since the last reset or flush.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Current recording state.
    pub fn state(&self) -> ListState {
        self.state
    }

    /// Contract violations rejected over the list's lifetime.
    pub fn violation_count(&self) -> u32 {
        self.violations
    }

    /// `true` between `begin_render_pass` and `finish_render_pass`.
    pub fn is_in_render_pass(&self) -> bool {
        self.in_render_pass
    }

    /// Number of debug marker regions left open.
    pub fn marker_depth(&self) -> u32 {
        self.marker_depth
    }

    /// Drops recorded commands and reopens the list for recording.
    pub fn reset(&mut self) {
        self.commands.clear();
        self.state = ListState::Recording;
        self.in_render_pass = false;
        self.marker_depth = 0;
    }

    /// Ends recording and hands the stream over for submission.
    ///
    /// An open render pass is finished implicitly and counted as a violation.
    /// Open debug markers are closed.
    pub(crate) fn close(&mut self) -> Vec<Command> {
        let mut commands = self.take_for_flush();
        commands.extend((0..self.marker_depth).map(|_| Command::FinishDebugMarker));
        self.marker_depth = 0;
        self.state = ListState::Closed;
        commands
    }

    /// Hands the recorded commands over while the list keeps recording.
    ///
    /// Debug marker regions stay open across the flush.
    pub(crate) fn take_for_flush(&mut self) -> Vec<Command> {
        if self.in_render_pass {
            self.violation("submitted with an open render pass, finishing it");
            self.commands.push(Command::FinishRenderPass);
            self.in_render_pass = false;
        }
        std::mem::take(&mut self.commands)
    }

    fn violation(&mut self, what: &str) {
        self.violations += 1;
        log::warn!("SoftCommandList: {what}");
    }

    fn record(&mut self, command: Command) {
        if self.state == ListState::Closed {
            self.violation("recording into a closed list, command dropped");
            return;
        }
        self.commands.push(command);
    }
}

impl ApiObject for SoftCommandList {
    fn native_object(&self) -> u64 {
        self.id
    }

    fn user_data(&self) -> &UserDataSlots {
        &self.user_data
    }
}

impl CommandList for SoftCommandList {
    fn device(&self) -> &dyn Device {
        &self.device
    }

    fn barrier(
        &mut self,
        resources: &[ResourceHandle],
        old_states: &[ResourceUsage],
        new_states: &[ResourceUsage],
    ) {
        if resources.len() != old_states.len() || resources.len() != new_states.len() {
            self.violation("barrier slices differ in length, command dropped");
            return;
        }
        if resources.is_empty() {
            return;
        }
        self.record(Command::Barrier {
            resources: resources.to_vec(),
            old_states: old_states.to_vec(),
            new_states: new_states.to_vec(),
        });
    }

    fn bind_pipeline(&mut self, pipeline_type: PipelineType, pipeline: PipelineHandle) {
        self.record(Command::BindPipeline {
            pipeline_type,
            pipeline,
        });
    }

    fn bind_pipeline_states(&mut self, states: &[(PipelineState, u32)]) {
        self.record(Command::BindPipelineStates(states.to_vec()));
    }

    fn bind_viewports(&mut self, first: u32, viewports: &[Viewport]) {
        self.record(Command::BindViewports {
            first,
            viewports: viewports.to_vec(),
        });
    }

    fn bind_scissor_rects(&mut self, first: u32, rects: &[Rect]) {
        self.record(Command::BindScissorRects {
            first,
            rects: rects.to_vec(),
        });
    }

    fn push_constants(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayoutHandle,
        layout_param: u32,
        first: u32,
        values: &[u32],
    ) {
        self.record(Command::PushConstants {
            stages,
            layout,
            layout_param,
            first,
            values: values.to_vec(),
        });
    }

    fn push_descriptors(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayoutHandle,
        layout_param: u32,
        first: u32,
        descriptors: &[Descriptor],
    ) {
        self.record(Command::PushDescriptors {
            stages,
            layout,
            layout_param,
            first,
            descriptors: descriptors.to_vec(),
        });
    }

    fn bind_descriptor_sets(
        &mut self,
        pipeline_type: PipelineType,
        layout: PipelineLayoutHandle,
        first: u32,
        sets: &[DescriptorSetHandle],
    ) {
        self.record(Command::BindDescriptorSets {
            pipeline_type,
            layout,
            first,
            sets: sets.to_vec(),
        });
    }

    fn bind_index_buffer(&mut self, buffer: ResourceHandle, offset: u64, index_size: u32) {
        self.record(Command::BindIndexBuffer {
            buffer,
            offset,
            index_size,
        });
    }

    fn bind_vertex_buffers(
        &mut self,
        first: u32,
        buffers: &[ResourceHandle],
        offsets: &[u64],
        strides: &[u32],
    ) {
        if buffers.len() != offsets.len() || buffers.len() != strides.len() {
            self.violation("vertex buffer slices differ in length, command dropped");
            return;
        }
        self.record(Command::BindVertexBuffers {
            first,
            buffers: buffers.to_vec(),
            offsets: offsets.to_vec(),
            strides: strides.to_vec(),
        });
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.record(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.record(Command::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
        self.record(Command::Dispatch {
            x: group_count_x,
            y: group_count_y,
            z: group_count_z,
        });
    }

    fn draw_or_dispatch_indirect(
        &mut self,
        command: IndirectCommand,
        buffer: ResourceHandle,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) {
        self.record(Command::DrawOrDispatchIndirect {
            command,
            buffer,
            offset,
            draw_count,
            stride,
        });
    }

    fn begin_render_pass(&mut self, rtvs: &[ResourceViewHandle], dsv: ResourceViewHandle) {
        if self.state == ListState::Recording && self.in_render_pass {
            self.violation("begin_render_pass inside an open pass, command dropped");
            return;
        }
        if self.state == ListState::Recording {
            self.in_render_pass = true;
        }
        self.record(Command::BeginRenderPass {
            rtvs: rtvs.to_vec(),
            dsv,
        });
    }

    fn finish_render_pass(&mut self) {
        if self.state == ListState::Recording && !self.in_render_pass {
            self.violation("finish_render_pass without a matching begin, command dropped");
            return;
        }
        self.in_render_pass = false;
        self.record(Command::FinishRenderPass);
    }

    fn copy_resource(&mut self, source: ResourceHandle, destination: ResourceHandle) {
        self.record(Command::CopyResource {
            source,
            destination,
        });
    }

    fn copy_buffer_region(
        &mut self,
        source: ResourceHandle,
        source_offset: u64,
        destination: ResourceHandle,
        destination_offset: u64,
        size: u64,
    ) {
        self.record(Command::CopyBufferRegion {
            source,
            source_offset,
            destination,
            destination_offset,
            size,
        });
    }

    fn copy_buffer_to_texture(
        &mut self,
        source: ResourceHandle,
        source_offset: u64,
        row_length: u32,
        slice_height: u32,
        destination: ResourceHandle,
        destination_subresource: u32,
        destination_box: Option<&SubresourceBox>,
    ) {
        self.record(Command::CopyBufferToTexture {
            source,
            source_offset,
            row_length,
            slice_height,
            destination,
            destination_subresource,
            destination_box: destination_box.copied(),
        });
    }

    fn copy_texture_region(
        &mut self,
        source: ResourceHandle,
        source_subresource: u32,
        source_box: Option<&SubresourceBox>,
        destination: ResourceHandle,
        destination_subresource: u32,
        destination_box: Option<&SubresourceBox>,
        filter: TextureFilter,
    ) {
        self.record(Command::CopyTextureRegion {
            source,
            source_subresource,
            source_box: source_box.copied(),
            destination,
            destination_subresource,
            destination_box: destination_box.copied(),
            filter,
        });
    }

    fn copy_texture_to_buffer(
        &mut self,
        source: ResourceHandle,
        source_subresource: u32,
        source_box: Option<&SubresourceBox>,
        destination: ResourceHandle,
        destination_offset: u64,
        row_length: u32,
        slice_height: u32,
    ) {
        self.record(Command::CopyTextureToBuffer {
            source,
            source_subresource,
            source_box: source_box.copied(),
            destination,
            destination_offset,
            row_length,
            slice_height,
        });
    }

    fn resolve_texture_region(
        &mut self,
        source: ResourceHandle,
        source_subresource: u32,
        source_box: Option<&SubresourceBox>,
        destination: ResourceHandle,
        destination_subresource: u32,
        destination_offset: [u32; 3],
        format: Format,
    ) {
        self.record(Command::ResolveTextureRegion {
            source,
            source_subresource,
            source_box: source_box.copied(),
            destination,
            destination_subresource,
            destination_offset,
            format,
        });
    }

    fn generate_mipmaps(&mut self, srv: ResourceViewHandle) {
        self.record(Command::GenerateMipmaps(srv));
    }

    fn clear_depth_stencil_view(
        &mut self,
        dsv: ResourceViewHandle,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) {
        self.record(Command::ClearDepthStencilView {
            dsv,
            flags,
            depth,
            stencil,
        });
    }

    fn clear_render_target_views(&mut self, rtvs: &[ResourceViewHandle], color: [f32; 4]) {
        self.record(Command::ClearRenderTargetViews {
            rtvs: rtvs.to_vec(),
            color,
        });
    }

    fn clear_unordered_access_view_uint(&mut self, uav: ResourceViewHandle, values: [u32; 4]) {
        self.record(Command::ClearUnorderedAccessViewUint { uav, values });
    }

    fn clear_unordered_access_view_float(&mut self, uav: ResourceViewHandle, values: [f32; 4]) {
        self.record(Command::ClearUnorderedAccessViewFloat { uav, values });
    }

    fn begin_query(&mut self, pool: QueryPoolHandle, query_type: QueryType, index: u32) {
        self.record(Command::BeginQuery {
            pool,
            query_type,
            index,
        });
    }

    fn finish_query(&mut self, pool: QueryPoolHandle, query_type: QueryType, index: u32) {
        self.record(Command::FinishQuery {
            pool,
            query_type,
            index,
        });
    }

    fn copy_query_results(
        &mut self,
        pool: QueryPoolHandle,
        query_type: QueryType,
        first: u32,
        count: u32,
        destination: ResourceHandle,
        destination_offset: u64,
        stride: u32,
    ) {
        self.record(Command::CopyQueryResults {
            pool,
            query_type,
            first,
            count,
            destination,
            destination_offset,
            stride,
        });
    }

    fn add_debug_marker(&mut self, label: &str, color: [f32; 4]) {
        self.record(Command::AddDebugMarker {
            label: label.to_owned(),
            color,
        });
    }

    fn begin_debug_marker(&mut self, label: &str, color: [f32; 4]) {
        if self.state == ListState::Recording {
            self.marker_depth += 1;
        }
        self.record(Command::BeginDebugMarker {
            label: label.to_owned(),
            color,
        });
    }

    fn finish_debug_marker(&mut self) {
        if self.state == ListState::Recording && self.marker_depth == 0 {
            log::debug!("SoftCommandList: Ignoring finish_debug_marker with no open marker");
            return;
        }
        self.marker_depth = self.marker_depth.saturating_sub(1);
        self.record(Command::FinishDebugMarker);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
