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
use super::device::Device;
use crate::api::descriptor::{Descriptor, ShaderStage};
use crate::api::format::Format;
use crate::api::handle::*;
use crate::api::indirect::IndirectCommand;
use crate::api::pipeline::{PipelineState, PipelineType};
use crate::api::query::QueryType;
use crate::api::render::{ClearFlags, Rect, Viewport};
use crate::api::resource::{ResourceUsage, SubresourceBox, TextureFilter};
use std::any::Any;

/// An ordered stream of GPU operations recorded against one [`Device`].
///
/// Recording has no effect by itself; the list executes when submitted through
/// a `CommandQueue` (or, for the immediate list, when the queue flushes it).
///
/// None of these calls validates bound state, capabilities or resource states.
/// In particular copies expect their source in `COPY_SOURCE` and destination
/// in `COPY_DEST` state, and no barrier is inserted on the caller's behalf.
///
/// Render passes never nest: `begin_render_pass` and `finish_render_pass`
/// alternate. Debug marker regions should balance, but an extra
/// `finish_debug_marker` is ignored.
pub trait CommandList: ApiObject + Send {
    /// The device this list records against.
    fn device(&self) -> &dyn Device;

    /// Records resource state transitions.
    ///
    /// The three slices run in parallel. A resource whose old and new state
    /// are both `UNORDERED_ACCESS` gets a same-state hazard barrier instead of
    /// a transition.
    fn barrier(
        &mut self,
        resources: &[ResourceHandle],
        old_states: &[ResourceUsage],
        new_states: &[ResourceUsage],
    );

    /// Records a single state transition.
    fn barrier_one(
        &mut self,
        resource: ResourceHandle,
        old_state: ResourceUsage,
        new_state: ResourceUsage,
    ) {
        self.barrier(&[resource], &[old_state], &[new_state]);
    }

    /// Binds a pipeline to the binding point of its type.
    fn bind_pipeline(&mut self, pipeline_type: PipelineType, pipeline: PipelineHandle);

    /// Sets dynamic pipeline states, as `(state, raw value)` pairs.
    fn bind_pipeline_states(&mut self, states: &[(PipelineState, u32)]);

    /// Binds viewports starting at slot `first`.
    fn bind_viewports(&mut self, first: u32, viewports: &[Viewport]);

    /// Binds scissor rectangles starting at slot `first`.
    fn bind_scissor_rects(&mut self, first: u32, rects: &[Rect]);

    /// Updates 32-bit push constants of layout parameter `layout_param`.
    fn push_constants(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayoutHandle,
        layout_param: u32,
        first: u32,
        values: &[u32],
    );

    /// Writes descriptors directly into layout parameter `layout_param`.
    fn push_descriptors(
        &mut self,
        stages: ShaderStage,
        layout: PipelineLayoutHandle,
        layout_param: u32,
        first: u32,
        descriptors: &[Descriptor],
    );

    /// Binds descriptor sets to consecutive layout parameters starting at `first`.
    fn bind_descriptor_sets(
        &mut self,
        pipeline_type: PipelineType,
        layout: PipelineLayoutHandle,
        first: u32,
        sets: &[DescriptorSetHandle],
    );

    /// Binds the index buffer; `index_size` is 2 or 4 bytes.
    fn bind_index_buffer(&mut self, buffer: ResourceHandle, offset: u64, index_size: u32);

    /// Binds vertex buffers to consecutive slots starting at `first`.
    fn bind_vertex_buffers(
        &mut self,
        first: u32,
        buffers: &[ResourceHandle],
        offsets: &[u64],
        strides: &[u32],
    );

    /// Binds a single vertex buffer.
    fn bind_vertex_buffer(&mut self, slot: u32, buffer: ResourceHandle, offset: u64, stride: u32) {
        self.bind_vertex_buffers(slot, &[buffer], &[offset], &[stride]);
    }

    /// Records a non-indexed draw.
    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);

    /// Records an indexed draw.
    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );

    /// Records a compute dispatch.
    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32);

    /// Records `draw_count` draws or dispatches whose arguments are read from
    /// `buffer` at `offset + i * stride`.
    fn draw_or_dispatch_indirect(
        &mut self,
        command: IndirectCommand,
        buffer: ResourceHandle,
        offset: u64,
        draw_count: u32,
        stride: u32,
    );

    /// Variant of [`draw_or_dispatch_indirect`](Self::draw_or_dispatch_indirect)
    /// taking the native integer tag.
    ///
    /// ## Returns
    /// `false`, with nothing recorded, when `tag` names no indirect command.
    fn draw_or_dispatch_indirect_raw(
        &mut self,
        tag: u32,
        buffer: ResourceHandle,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> bool {
        match IndirectCommand::try_from(tag) {
            Ok(command) => {
                self.draw_or_dispatch_indirect(command, buffer, offset, draw_count, stride);
                true
            }
            Err(e) => {
                log::error!("CommandList: {e}, indirect call dropped.");
                false
            }
        }
    }

    /// Begins a render pass writing the given render targets and depth-stencil view.
    fn begin_render_pass(&mut self, rtvs: &[ResourceViewHandle], dsv: ResourceViewHandle);

    /// Ends the active render pass.
    fn finish_render_pass(&mut self);

    /// Copies a whole resource into another of identical description.
    fn copy_resource(&mut self, source: ResourceHandle, destination: ResourceHandle);

    /// Copies `size` bytes between buffers.
    fn copy_buffer_region(
        &mut self,
        source: ResourceHandle,
        source_offset: u64,
        destination: ResourceHandle,
        destination_offset: u64,
        size: u64,
    );

    /// Copies tightly described buffer data into a texture region.
    ///
    /// ## Arguments
    /// * `row_length` - Texels per row in the buffer, zero for tightly packed.
    /// * `slice_height` - Rows per slice in the buffer, zero for tightly packed.
    #[allow(clippy::too_many_arguments)]
    fn copy_buffer_to_texture(
        &mut self,
        source: ResourceHandle,
        source_offset: u64,
        row_length: u32,
        slice_height: u32,
        destination: ResourceHandle,
        destination_subresource: u32,
        destination_box: Option<&SubresourceBox>,
    );

    /// Copies a texture region, scaling with `filter` when the boxes differ in size.
    #[allow(clippy::too_many_arguments)]
    fn copy_texture_region(
        &mut self,
        source: ResourceHandle,
        source_subresource: u32,
        source_box: Option<&SubresourceBox>,
        destination: ResourceHandle,
        destination_subresource: u32,
        destination_box: Option<&SubresourceBox>,
        filter: TextureFilter,
    );

    /// Copies a texture region into a buffer.
    #[allow(clippy::too_many_arguments)]
    fn copy_texture_to_buffer(
        &mut self,
        source: ResourceHandle,
        source_subresource: u32,
        source_box: Option<&SubresourceBox>,
        destination: ResourceHandle,
        destination_offset: u64,
        row_length: u32,
        slice_height: u32,
    );

    /// Resolves a multisampled region into a single-sampled texture.
    #[allow(clippy::too_many_arguments)]
    fn resolve_texture_region(
        &mut self,
        source: ResourceHandle,
        source_subresource: u32,
        source_box: Option<&SubresourceBox>,
        destination: ResourceHandle,
        destination_subresource: u32,
        destination_offset: [u32; 3],
        format: Format,
    );

    /// Regenerates every mip level below the first one visible through `srv`.
    fn generate_mipmaps(&mut self, srv: ResourceViewHandle);

    /// Clears depth and/or stencil of a depth-stencil view.
    fn clear_depth_stencil_view(
        &mut self,
        dsv: ResourceViewHandle,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    );

    /// Clears render target views to one colour.
    fn clear_render_target_views(&mut self, rtvs: &[ResourceViewHandle], color: [f32; 4]);

    /// Clears a single render target view.
    fn clear_render_target_view(&mut self, rtv: ResourceViewHandle, color: [f32; 4]) {
        self.clear_render_target_views(&[rtv], color);
    }

    /// Clears an unordered access view with integer values.
    fn clear_unordered_access_view_uint(&mut self, uav: ResourceViewHandle, values: [u32; 4]);

    /// Clears an unordered access view with float values.
    fn clear_unordered_access_view_float(&mut self, uav: ResourceViewHandle, values: [f32; 4]);

    /// Starts query `index` of `pool`.
    fn begin_query(&mut self, pool: QueryPoolHandle, query_type: QueryType, index: u32);

    /// Ends query `index` of `pool`, making its result available once executed.
    fn finish_query(&mut self, pool: QueryPoolHandle, query_type: QueryType, index: u32);

    /// Copies query results into a buffer on the GPU timeline.
    #[allow(clippy::too_many_arguments)]
    fn copy_query_results(
        &mut self,
        pool: QueryPoolHandle,
        query_type: QueryType,
        first: u32,
        count: u32,
        destination: ResourceHandle,
        destination_offset: u64,
        stride: u32,
    );

    /// Inserts a single debug label.
    fn add_debug_marker(&mut self, label: &str, color: [f32; 4]);

    /// Opens a debug label region.
    fn begin_debug_marker(&mut self, label: &str, color: [f32; 4]);

    /// Closes the innermost debug label region.
    fn finish_debug_marker(&mut self);

    /// Allows downcasting to the concrete backend type on submission.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
