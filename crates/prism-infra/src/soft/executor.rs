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

//! Replays submitted command streams against device memory.

use super::command::Command;
use super::device::{QuerySlot, SoftDevice, ViewEntry, STATISTICS_COUNTERS};
use super::lock;
use super::memory::{self, ResourceEntry};
use prism_core::api::caps::DeviceCaps;
use prism_core::api::format::Format;
use prism_core::api::handle::*;
use prism_core::api::indirect::{
    DispatchIndirectArgs, DrawIndexedIndirectArgs, DrawIndirectArgs, IndirectCommand,
};
use prism_core::api::pipeline::PipelineType;
use prism_core::api::query::QueryType;
use prism_core::api::render::ClearFlags;
use prism_core::api::resource::{ResourceUsage, SubresourceBox};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::Ordering;

/// Observable effect of one replayed command.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutedOp {
    /// A barrier moved `resource` to `new`.
    Transition {
        resource: ResourceHandle,
        old: ResourceUsage,
        new: ResourceUsage,
    },
    /// An unordered-access to unordered-access barrier: a hazard, not a transition.
    UnorderedAccessBarrier { resource: ResourceHandle },
    Draw {
        pipeline: PipelineHandle,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        pipeline: PipelineHandle,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    Dispatch {
        pipeline: PipelineHandle,
        x: u32,
        y: u32,
        z: u32,
    },
    /// A command that could not run, with the reason.
    Skipped {
        operation: &'static str,
        reason: String,
    },
}

// Pipeline statistics counters, in result order.
const IA_VERTICES: usize = 0;
const IA_PRIMITIVES: usize = 1;
const VS_INVOCATIONS: usize = 2;
const C_INVOCATIONS: usize = 5;
const C_PRIMITIVES: usize = 6;
const PS_INVOCATIONS: usize = 7;
const CS_INVOCATIONS: usize = 10;

#[derive(Debug)]
struct ActiveQuery {
    pool: QueryPoolHandle,
    index: u32,
    query_type: QueryType,
    values: [u64; STATISTICS_COUNTERS],
}

type Resources = HashMap<ResourceHandle, ResourceEntry>;

fn entry(resources: &Resources, handle: ResourceHandle) -> Result<&ResourceEntry, String> {
    resources
        .get(&handle)
        .ok_or_else(|| format!("unknown resource {handle:?}"))
}

fn entry_mut(resources: &mut Resources, handle: ResourceHandle) -> Result<&mut ResourceEntry, String> {
    resources
        .get_mut(&handle)
        .ok_or_else(|| format!("unknown resource {handle:?}"))
}

fn view(device: &SoftDevice, handle: ResourceViewHandle) -> Result<ViewEntry, String> {
    lock(&device.internal.views)
        .get(&handle)
        .copied()
        .ok_or_else(|| format!("unknown view {handle:?}"))
}

fn byte_range(offset: u64, size: u64, len: usize) -> Result<Range<usize>, String> {
    let start = usize::try_from(offset).map_err(|_| format!("offset {offset} out of range"))?;
    let end = usize::try_from(size)
        .ok()
        .and_then(|size| start.checked_add(size))
        .filter(|end| *end <= len)
        .ok_or_else(|| format!("bytes {offset}+{size} exceed {len}"))?;
    Ok(start..end)
}

fn gate(device: &SoftDevice, capability: DeviceCaps) -> Result<(), String> {
    if device.has(capability) {
        Ok(())
    } else {
        Err(format!("device lacks {capability:?}"))
    }
}

/// Counts a copy touching `resource` while its shadow state lacks `wanted`.
fn note_state(
    device: &SoftDevice,
    resource: ResourceHandle,
    state: ResourceUsage,
    wanted: ResourceUsage,
    operation: &str,
) {
    if !state.intersects(wanted) {
        device.internal.hazards.fetch_add(1, Ordering::Relaxed);
        log::warn!(
            "SoftDevice: {operation} uses {resource:?} in {state:?} without a transition to {wanted:?}"
        );
    }
}

fn check_subresource(entry: &ResourceEntry, subresource: u32) -> Result<(), String> {
    entry
        .subresource_range(subresource)
        .map(|_| ())
        .ok_or_else(|| format!("subresource {subresource} out of range"))
}

impl Command {
    pub(crate) fn operation_name(&self) -> &'static str {
        match self {
            Command::Barrier { .. } => "barrier",
            Command::BindPipeline { .. } => "bind_pipeline",
            Command::BindPipelineStates(_) => "bind_pipeline_states",
            Command::BindViewports { .. } => "bind_viewports",
            Command::BindScissorRects { .. } => "bind_scissor_rects",
            Command::PushConstants { .. } => "push_constants",
            Command::PushDescriptors { .. } => "push_descriptors",
            Command::BindDescriptorSets { .. } => "bind_descriptor_sets",
            Command::BindIndexBuffer { .. } => "bind_index_buffer",
            Command::BindVertexBuffers { .. } => "bind_vertex_buffers",
            Command::Draw { .. } => "draw",
            Command::DrawIndexed { .. } => "draw_indexed",
            Command::Dispatch { .. } => "dispatch",
            Command::DrawOrDispatchIndirect { .. } => "draw_or_dispatch_indirect",
            Command::BeginRenderPass { .. } => "begin_render_pass",
            Command::FinishRenderPass => "finish_render_pass",
            Command::CopyResource { .. } => "copy_resource",
            Command::CopyBufferRegion { .. } => "copy_buffer_region",
            Command::CopyBufferToTexture { .. } => "copy_buffer_to_texture",
            Command::CopyTextureRegion { .. } => "copy_texture_region",
            Command::CopyTextureToBuffer { .. } => "copy_texture_to_buffer",
            Command::ResolveTextureRegion { .. } => "resolve_texture_region",
            Command::GenerateMipmaps(_) => "generate_mipmaps",
            Command::ClearDepthStencilView { .. } => "clear_depth_stencil_view",
            Command::ClearRenderTargetViews { .. } => "clear_render_target_views",
            Command::ClearUnorderedAccessViewUint { .. } => "clear_unordered_access_view_uint",
            Command::ClearUnorderedAccessViewFloat { .. } => "clear_unordered_access_view_float",
            Command::BeginQuery { .. } => "begin_query",
            Command::FinishQuery { .. } => "finish_query",
            Command::CopyQueryResults { .. } => "copy_query_results",
            Command::AddDebugMarker { .. } => "add_debug_marker",
            Command::BeginDebugMarker { .. } => "begin_debug_marker",
            Command::FinishDebugMarker => "finish_debug_marker",
        }
    }
}

/// Executes `commands` in order and appends their effects to the device log.
pub(crate) fn execute(device: &SoftDevice, commands: &[Command]) {
    let mut replay = Replay {
        device,
        graphics_pipeline: PipelineHandle::NONE,
        compute_pipeline: PipelineHandle::NONE,
        active_queries: Vec::new(),
        ops: Vec::new(),
    };
    for command in commands {
        if let Err(reason) = replay.apply(command) {
            let operation = command.operation_name();
            log::warn!("SoftDevice: Skipped {operation}: {reason}");
            replay.ops.push(ExecutedOp::Skipped { operation, reason });
        }
    }
    if !replay.active_queries.is_empty() {
        log::warn!(
            "SoftDevice: {} queries still active at the end of a submission",
            replay.active_queries.len()
        );
    }
    log::trace!("SoftDevice: Replayed {} commands", commands.len());
    lock(&device.internal.executed).extend(replay.ops);
}

struct Replay<'a> {
    device: &'a SoftDevice,
    graphics_pipeline: PipelineHandle,
    compute_pipeline: PipelineHandle,
    active_queries: Vec<ActiveQuery>,
    ops: Vec<ExecutedOp>,
}

impl Replay<'_> {
    fn apply(&mut self, command: &Command) -> Result<(), String> {
        match command {
            Command::Barrier {
                resources,
                old_states,
                new_states,
            } => self.barrier(resources, old_states, new_states),
            Command::BindPipeline {
                pipeline_type,
                pipeline,
            } => self.bind_pipeline(*pipeline_type, *pipeline),
            Command::PushConstants {
                layout,
                layout_param,
                first,
                values,
                ..
            } => self.check_constants(*layout, *layout_param, *first, values.len()),
            Command::BindDescriptorSets {
                pipeline_type,
                layout,
                first,
                sets,
            } => {
                self.check_pipeline_layout(*pipeline_type, *layout)?;
                self.check_sets(*layout, *first, sets)
            }
            Command::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                self.draw(*vertex_count, *instance_count, *first_vertex, *first_instance);
                Ok(())
            }
            Command::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            } => {
                self.draw_indexed(
                    *index_count,
                    *instance_count,
                    *first_index,
                    *vertex_offset,
                    *first_instance,
                );
                Ok(())
            }
            Command::Dispatch { x, y, z } => self.dispatch(*x, *y, *z),
            Command::DrawOrDispatchIndirect {
                command,
                buffer,
                offset,
                draw_count,
                stride,
            } => self.indirect(*command, *buffer, *offset, *draw_count, *stride),
            Command::CopyResource {
                source,
                destination,
            } => self.copy_resource(*source, *destination),
            Command::CopyBufferRegion {
                source,
                source_offset,
                destination,
                destination_offset,
                size,
            } => self.copy_buffer_region(*source, *source_offset, *destination, *destination_offset, *size),
            Command::CopyBufferToTexture {
                source,
                source_offset,
                row_length,
                slice_height,
                destination,
                destination_subresource,
                destination_box,
            } => self.copy_buffer_to_texture(
                *source,
                *source_offset,
                (*row_length, *slice_height),
                *destination,
                *destination_subresource,
                destination_box.as_ref(),
            ),
            Command::CopyTextureRegion {
                source,
                source_subresource,
                source_box,
                destination,
                destination_subresource,
                destination_box,
                ..
            } => self.copy_texture_region(
                (*source, *source_subresource, source_box.as_ref()),
                (*destination, *destination_subresource, destination_box.as_ref()),
            ),
            Command::CopyTextureToBuffer {
                source,
                source_subresource,
                source_box,
                destination,
                destination_offset,
                row_length,
                slice_height,
            } => self.copy_texture_to_buffer(
                (*source, *source_subresource, source_box.as_ref()),
                *destination,
                *destination_offset,
                (*row_length, *slice_height),
            ),
            Command::ResolveTextureRegion {
                source,
                source_subresource,
                source_box,
                destination,
                destination_subresource,
                destination_offset,
                format,
            } => self.resolve(
                (*source, *source_subresource, source_box.as_ref()),
                (*destination, *destination_subresource),
                *destination_offset,
                *format,
            ),
            Command::GenerateMipmaps(srv) => self.generate_mipmaps(*srv),
            Command::ClearDepthStencilView {
                dsv,
                flags,
                depth,
                stencil,
            } => self.clear_depth_stencil(*dsv, *flags, *depth, *stencil),
            Command::ClearRenderTargetViews { rtvs, color } => {
                rtvs.iter().try_for_each(|rtv| self.clear_render_target(*rtv, *color))
            }
            Command::ClearUnorderedAccessViewUint { uav, values } => {
                self.clear_unordered_access(*uav, memory::pack_uint(Format::R32Uint, *values), |f| {
                    memory::pack_uint(f, *values)
                })
            }
            Command::ClearUnorderedAccessViewFloat { uav, values } => {
                self.clear_unordered_access(*uav, memory::pack_color(Format::R32Float, *values), |f| {
                    memory::pack_color(f, *values)
                })
            }
            Command::BeginQuery {
                pool,
                query_type,
                index,
            } => self.begin_query(*pool, *query_type, *index),
            Command::FinishQuery {
                pool,
                query_type,
                index,
            } => self.finish_query(*pool, *query_type, *index),
            Command::CopyQueryResults {
                pool,
                query_type,
                first,
                count,
                destination,
                destination_offset,
                stride,
            } => self.copy_query_results(
                (*pool, *query_type, *first, *count),
                *destination,
                *destination_offset,
                *stride,
            ),
            Command::AddDebugMarker { label, .. } | Command::BeginDebugMarker { label, .. } => {
                log::trace!("SoftDevice: Marker '{label}'");
                Ok(())
            }
            Command::BindPipelineStates(_)
            | Command::BindViewports { .. }
            | Command::BindScissorRects { .. }
            | Command::PushDescriptors { .. }
            | Command::BindIndexBuffer { .. }
            | Command::BindVertexBuffers { .. }
            | Command::BeginRenderPass { .. }
            | Command::FinishRenderPass
            | Command::FinishDebugMarker => Ok(()),
        }
    }

    // --- State ---

    fn barrier(
        &mut self,
        resources: &[ResourceHandle],
        old_states: &[ResourceUsage],
        new_states: &[ResourceUsage],
    ) -> Result<(), String> {
        let device = self.device;
        let mut live = lock(&device.internal.resources);
        for ((resource, old), new) in resources.iter().zip(old_states).zip(new_states) {
            let entry = entry_mut(&mut live, *resource)?;
            if *old == *new && *old == ResourceUsage::UNORDERED_ACCESS {
                self.ops.push(ExecutedOp::UnorderedAccessBarrier { resource: *resource });
                continue;
            }
            if entry.state != *old {
                log::debug!(
                    "SoftDevice: Barrier declares {resource:?} in {old:?}, last known {:?}",
                    entry.state
                );
            }
            entry.state = *new;
            self.ops.push(ExecutedOp::Transition {
                resource: *resource,
                old: *old,
                new: *new,
            });
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline_type: PipelineType, pipeline: PipelineHandle) -> Result<(), String> {
        let actual = lock(&self.device.internal.pipelines)
            .get(&pipeline)
            .map(|p| p.pipeline_type);
        match actual {
            Some(actual) if actual != pipeline_type => {
                Err(format!("{pipeline:?} is a {actual:?} pipeline"))
            }
            _ => {
                match pipeline_type {
                    PipelineType::Graphics => self.graphics_pipeline = pipeline,
                    PipelineType::Compute => self.compute_pipeline = pipeline,
                }
                Ok(())
            }
        }
    }

    /// Rejects sets bound through a layout other than the bound pipeline's.
    fn check_pipeline_layout(
        &self,
        pipeline_type: PipelineType,
        layout: PipelineLayoutHandle,
    ) -> Result<(), String> {
        let bound = match pipeline_type {
            PipelineType::Graphics => self.graphics_pipeline,
            PipelineType::Compute => self.compute_pipeline,
        };
        let expected = lock(&self.device.internal.pipelines)
            .get(&bound)
            .map(|p| p.layout)
            .filter(|l| l.is_some());
        match expected {
            Some(expected) if expected != layout => Err(format!(
                "{bound:?} was created with {expected:?}, sets bound through {layout:?}"
            )),
            _ => Ok(()),
        }
    }

    fn check_constants(
        &self,
        layout: PipelineLayoutHandle,
        param: u32,
        first: u32,
        count: usize,
    ) -> Result<(), String> {
        let layouts = lock(&self.device.internal.pipeline_layouts);
        let entry = layouts
            .get(&layout)
            .ok_or_else(|| format!("unknown pipeline layout {layout:?}"))?;
        let range = entry
            .constant_ranges
            .get(param as usize)
            .ok_or_else(|| format!("layout has no constant range {param}"))?;
        if u64::from(first) + count as u64 > u64::from(range.count) {
            return Err(format!(
                "values {first}+{count} exceed the {} constants of range {param}",
                range.count
            ));
        }
        Ok(())
    }

    fn check_sets(
        &self,
        layout: PipelineLayoutHandle,
        first: u32,
        sets: &[DescriptorSetHandle],
    ) -> Result<(), String> {
        let expected = {
            let layouts = lock(&self.device.internal.pipeline_layouts);
            let entry = layouts
                .get(&layout)
                .ok_or_else(|| format!("unknown pipeline layout {layout:?}"))?;
            let end = first as usize + sets.len();
            entry
                .set_layouts
                .get(first as usize..end)
                .ok_or_else(|| format!("sets {first}..{end} exceed the layout"))?
                .to_vec()
        };
        let live = lock(&self.device.internal.descriptor_sets);
        for (set, wanted) in sets.iter().zip(expected) {
            match live.get(set) {
                Some(entry) if entry.layout == wanted => {}
                Some(entry) => {
                    return Err(format!("{set:?} was allocated from {:?}", entry.layout))
                }
                None => return Err(format!("unknown descriptor set {set:?}")),
            }
        }
        Ok(())
    }

    // --- Draw & Dispatch ---

    fn count_draw(&mut self, vertices: u32, instances: u32) {
        let invocations = u64::from(vertices) * u64::from(instances);
        let primitives = invocations / 3;
        for query in &mut self.active_queries {
            match query.query_type {
                QueryType::Occlusion | QueryType::BinaryOcclusion => {
                    query.values[0] += invocations;
                }
                QueryType::PipelineStatistics => {
                    query.values[IA_VERTICES] += invocations;
                    query.values[IA_PRIMITIVES] += primitives;
                    query.values[VS_INVOCATIONS] += invocations;
                    query.values[C_INVOCATIONS] += primitives;
                    query.values[C_PRIMITIVES] += primitives;
                    query.values[PS_INVOCATIONS] += invocations;
                }
                QueryType::Timestamp => {}
            }
        }
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.count_draw(vertex_count, instance_count);
        self.ops.push(ExecutedOp::Draw {
            pipeline: self.graphics_pipeline,
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
        self.count_draw(index_count, instance_count);
        self.ops.push(ExecutedOp::DrawIndexed {
            pipeline: self.graphics_pipeline,
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<(), String> {
        gate(self.device, DeviceCaps::ComputeShader)?;
        let groups = u64::from(x) * u64::from(y) * u64::from(z);
        for query in &mut self.active_queries {
            if query.query_type == QueryType::PipelineStatistics {
                query.values[CS_INVOCATIONS] += groups;
            }
        }
        self.ops.push(ExecutedOp::Dispatch {
            pipeline: self.compute_pipeline,
            x,
            y,
            z,
        });
        Ok(())
    }

    fn indirect(
        &mut self,
        command: IndirectCommand,
        buffer: ResourceHandle,
        offset: u64,
        draw_count: u32,
        stride: u32,
    ) -> Result<(), String> {
        gate(self.device, DeviceCaps::DrawOrDispatchIndirect)?;
        let size = command.argument_size() as u64;
        let stride = if stride == 0 { size } else { u64::from(stride) };
        let records = {
            let resources = lock(&self.device.internal.resources);
            let source = entry(&resources, buffer)?;
            if !source.desc.is_buffer() {
                return Err(format!("{buffer:?} is not a buffer"));
            }
            (0..u64::from(draw_count))
                .map(|i| {
                    let range = byte_range(offset + i * stride, size, source.memory.len())?;
                    Ok(source.memory[range].to_vec())
                })
                .collect::<Result<Vec<_>, String>>()?
        };
        for record in records {
            match command {
                IndirectCommand::Draw => {
                    let args: DrawIndirectArgs = bytemuck::pod_read_unaligned(&record);
                    self.draw(
                        args.vertex_count,
                        args.instance_count,
                        args.first_vertex,
                        args.first_instance,
                    );
                }
                IndirectCommand::DrawIndexed => {
                    let args: DrawIndexedIndirectArgs = bytemuck::pod_read_unaligned(&record);
                    self.draw_indexed(
                        args.index_count,
                        args.instance_count,
                        args.first_index,
                        args.vertex_offset,
                        args.first_instance,
                    );
                }
                IndirectCommand::Dispatch => {
                    let args: DispatchIndirectArgs = bytemuck::pod_read_unaligned(&record);
                    self.dispatch(args.group_count_x, args.group_count_y, args.group_count_z)?;
                }
            }
        }
        Ok(())
    }

    // --- Copies ---

    fn copy_resource(&mut self, source: ResourceHandle, destination: ResourceHandle) -> Result<(), String> {
        let device = self.device;
        let mut resources = lock(&device.internal.resources);
        let src = entry(&resources, source)?;
        note_state(device, source, src.state, ResourceUsage::COPY_SOURCE, "copy_resource");
        let (data, src_type) = (src.memory.to_vec(), src.desc.resource_type);
        let dst = entry_mut(&mut resources, destination)?;
        note_state(device, destination, dst.state, ResourceUsage::COPY_DEST, "copy_resource");
        if dst.desc.resource_type != src_type || dst.memory.len() != data.len() {
            return Err("source and destination layouts differ".into());
        }
        dst.memory.copy_from_slice(&data);
        Ok(())
    }

    fn copy_buffer_region(
        &mut self,
        source: ResourceHandle,
        source_offset: u64,
        destination: ResourceHandle,
        destination_offset: u64,
        size: u64,
    ) -> Result<(), String> {
        let device = self.device;
        gate(device, DeviceCaps::CopyBufferRegion)?;
        let mut resources = lock(&device.internal.resources);
        let src = entry(&resources, source)?;
        note_state(device, source, src.state, ResourceUsage::COPY_SOURCE, "copy_buffer_region");
        let size = if size == u64::MAX {
            (src.memory.len() as u64).saturating_sub(source_offset)
        } else {
            size
        };
        let data = src.memory[byte_range(source_offset, size, src.memory.len())?].to_vec();
        let dst = entry_mut(&mut resources, destination)?;
        note_state(device, destination, dst.state, ResourceUsage::COPY_DEST, "copy_buffer_region");
        if !dst.desc.is_buffer() {
            return Err(format!("{destination:?} is not a buffer"));
        }
        let range = byte_range(destination_offset, size, dst.memory.len())?;
        dst.memory[range].copy_from_slice(&data);
        Ok(())
    }

    fn copy_buffer_to_texture(
        &mut self,
        source: ResourceHandle,
        source_offset: u64,
        (row_length, slice_height): (u32, u32),
        destination: ResourceHandle,
        subresource: u32,
        destination_box: Option<&SubresourceBox>,
    ) -> Result<(), String> {
        let device = self.device;
        gate(device, DeviceCaps::CopyBufferToTexture)?;
        let mut resources = lock(&device.internal.resources);
        let src = entry(&resources, source)?;
        note_state(device, source, src.state, ResourceUsage::COPY_SOURCE, "copy_buffer_to_texture");
        if !src.desc.is_buffer() {
            return Err(format!("{source:?} is not a buffer"));
        }
        let start = byte_range(source_offset, 0, src.memory.len())?.start;
        let data = src.memory[start..].to_vec();

        let dst = entry_mut(&mut resources, destination)?;
        note_state(device, destination, dst.state, ResourceUsage::COPY_DEST, "copy_buffer_to_texture");
        if dst.desc.is_buffer() {
            return Err(format!("{destination:?} is not a texture"));
        }
        check_subresource(dst, subresource)?;
        let region = memory::resolve_box(destination_box, dst.extent(subresource))
            .ok_or("destination box out of range")?;
        let row_length = if row_length == 0 { region.width() } else { row_length };
        let slice_height = if slice_height == 0 { region.height() } else { slice_height };
        let row_pitch = row_length as usize * dst.texel_size();
        let slice_pitch = row_pitch * slice_height as usize;
        if !dst.write_region(subresource, &region, &data, row_pitch, slice_pitch) {
            return Err("source buffer too small for the region".into());
        }
        Ok(())
    }

    fn copy_texture_to_buffer(
        &mut self,
        (source, subresource, source_box): (ResourceHandle, u32, Option<&SubresourceBox>),
        destination: ResourceHandle,
        destination_offset: u64,
        (row_length, slice_height): (u32, u32),
    ) -> Result<(), String> {
        let device = self.device;
        gate(device, DeviceCaps::CopyBufferToTexture)?;
        let mut resources = lock(&device.internal.resources);
        let src = entry(&resources, source)?;
        note_state(device, source, src.state, ResourceUsage::COPY_SOURCE, "copy_texture_to_buffer");
        if src.desc.is_buffer() {
            return Err(format!("{source:?} is not a texture"));
        }
        check_subresource(src, subresource)?;
        let region = memory::resolve_box(source_box, src.extent(subresource))
            .ok_or("source box out of range")?;
        let packed = src
            .read_region(subresource, &region)
            .ok_or("source region out of range")?;
        let row_bytes = region.width() as usize * src.texel_size();
        let row_length = if row_length == 0 { region.width() } else { row_length };
        let slice_height = if slice_height == 0 { region.height() } else { slice_height };
        let row_pitch = row_length as usize * src.texel_size();
        let slice_pitch = row_pitch * slice_height as usize;
        if row_pitch < row_bytes {
            return Err(format!("row length {row_length} shorter than the region"));
        }

        let dst = entry_mut(&mut resources, destination)?;
        note_state(device, destination, dst.state, ResourceUsage::COPY_DEST, "copy_texture_to_buffer");
        if !dst.desc.is_buffer() {
            return Err(format!("{destination:?} is not a buffer"));
        }
        let height = region.height() as usize;
        let span = (region.depth() as usize - 1) * slice_pitch + (height - 1) * row_pitch + row_bytes;
        let base = byte_range(destination_offset, span as u64, dst.memory.len())?.start;
        for (i, row) in packed.chunks_exact(row_bytes).enumerate() {
            let at = base + (i / height) * slice_pitch + (i % height) * row_pitch;
            dst.memory[at..at + row_bytes].copy_from_slice(row);
        }
        Ok(())
    }

    fn copy_texture_region(
        &mut self,
        (source, src_sub, source_box): (ResourceHandle, u32, Option<&SubresourceBox>),
        (destination, dst_sub, destination_box): (ResourceHandle, u32, Option<&SubresourceBox>),
    ) -> Result<(), String> {
        let device = self.device;
        let mut resources = lock(&device.internal.resources);
        let src = entry(&resources, source)?;
        note_state(device, source, src.state, ResourceUsage::COPY_SOURCE, "copy_texture_region");
        check_subresource(src, src_sub)?;
        let src_region = memory::resolve_box(source_box, src.extent(src_sub))
            .ok_or("source box out of range")?;
        let packed = src
            .read_region(src_sub, &src_region)
            .ok_or("source region out of range")?;
        let bpp = src.texel_size();

        let dst = entry_mut(&mut resources, destination)?;
        note_state(device, destination, dst.state, ResourceUsage::COPY_DEST, "copy_texture_region");
        check_subresource(dst, dst_sub)?;
        if dst.texel_size() != bpp {
            return Err("source and destination texel sizes differ".into());
        }
        let dst_region = match destination_box {
            Some(region) => *region,
            None => SubresourceBox::covering(src_region.width(), src_region.height(), src_region.depth()),
        };
        if !dst_region.fits(dst.extent(dst_sub)) {
            return Err("destination box out of range".into());
        }
        let src_dims = (src_region.width(), src_region.height(), src_region.depth());
        let dst_dims = (dst_region.width(), dst_region.height(), dst_region.depth());
        let data = if src_dims == dst_dims {
            packed
        } else {
            gate(device, DeviceCaps::Blit)?;
            memory::scale_nearest(&packed, src_dims, dst_dims, bpp)
        };
        if !dst.write_region(dst_sub, &dst_region, &data, 0, 0) {
            return Err("destination region out of range".into());
        }
        Ok(())
    }

    fn resolve(
        &mut self,
        (source, src_sub, source_box): (ResourceHandle, u32, Option<&SubresourceBox>),
        (destination, dst_sub): (ResourceHandle, u32),
        [x, y, z]: [u32; 3],
        format: Format,
    ) -> Result<(), String> {
        let device = self.device;
        if source_box.is_some() {
            gate(device, DeviceCaps::ResolveRegion)?;
        }
        let mut resources = lock(&device.internal.resources);
        let src = entry(&resources, source)?;
        note_state(device, source, src.state, ResourceUsage::RESOLVE_SOURCE, "resolve_texture_region");
        check_subresource(src, src_sub)?;
        if format != Format::Unknown && format.bytes_per_texel() as usize != src.texel_size() {
            return Err(format!("{format:?} does not match the source texels"));
        }
        let region = memory::resolve_box(source_box, src.extent(src_sub))
            .ok_or("source box out of range")?;
        let packed = src
            .read_region(src_sub, &region)
            .ok_or("source region out of range")?;

        let dst = entry_mut(&mut resources, destination)?;
        note_state(device, destination, dst.state, ResourceUsage::RESOLVE_DEST, "resolve_texture_region");
        check_subresource(dst, dst_sub)?;
        let target = SubresourceBox {
            left: x,
            top: y,
            front: z,
            right: x + region.width(),
            bottom: y + region.height(),
            back: z + region.depth(),
        };
        if !dst.write_region(dst_sub, &target, &packed, 0, 0) {
            return Err("destination region out of range".into());
        }
        Ok(())
    }

    fn generate_mipmaps(&mut self, srv: ResourceViewHandle) -> Result<(), String> {
        let view = view(self.device, srv)?;
        if view.usage_type != ResourceUsage::SHADER_RESOURCE {
            return Err(format!("{srv:?} is not a shader resource view"));
        }
        let mut resources = lock(&self.device.internal.resources);
        let entry = entry_mut(&mut resources, view.resource)?;
        if entry.desc.is_buffer() {
            return Err("buffers have no mip chain".into());
        }
        let mip_levels = entry.desc.mip_levels();
        let bpp = entry.texel_size();
        let average = memory::is_byte_unorm(view.format);
        for layer in view.first_layer..view.first_layer + view.layers {
            for level in view.first_level + 1..view.first_level + view.levels {
                let src_sub = level - 1 + layer * mip_levels;
                let dst_sub = level + layer * mip_levels;
                let (sw, sh, sd) = entry.extent(src_sub);
                let (dw, dh, dd) = entry.extent(dst_sub);
                let src = entry
                    .read_region(src_sub, &SubresourceBox::covering(sw, sh, sd))
                    .ok_or("mip level out of range")?;
                let data = memory::downsample(&src, (sw, sh, sd), (dw, dh, dd), bpp, average);
                entry.write_region(dst_sub, &SubresourceBox::covering(dw, dh, dd), &data, 0, 0);
            }
        }
        Ok(())
    }

    // --- Clears ---

    fn clear_render_target(&mut self, rtv: ResourceViewHandle, color: [f32; 4]) -> Result<(), String> {
        let view = view(self.device, rtv)?;
        if view.usage_type != ResourceUsage::RENDER_TARGET {
            return Err(format!("{rtv:?} is not a render target view"));
        }
        let texel = memory::pack_color(view.format, color)
            .ok_or_else(|| format!("{:?} cannot be cleared as a colour", view.format))?;
        let mut resources = lock(&self.device.internal.resources);
        let entry = entry_mut(&mut resources, view.resource)?;
        for sub in view.subresources(entry.desc.mip_levels()) {
            entry.fill(sub, &texel);
        }
        Ok(())
    }

    fn clear_depth_stencil(
        &mut self,
        dsv: ResourceViewHandle,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    ) -> Result<(), String> {
        let view = view(self.device, dsv)?;
        if !ResourceUsage::DEPTH_STENCIL.contains(view.usage_type) || !view.format.is_depth_stencil() {
            return Err(format!("{dsv:?} is not a depth-stencil view"));
        }
        if flags.is_empty() {
            log::trace!("SoftDevice: Depth-stencil clear of {dsv:?} names no aspect");
            return Ok(());
        }
        let bpp = view.format.bytes_per_texel() as usize;
        let mut resources = lock(&self.device.internal.resources);
        let entry = entry_mut(&mut resources, view.resource)?;
        for sub in view.subresources(entry.desc.mip_levels()) {
            let Some(range) = entry.subresource_range(sub) else {
                continue;
            };
            for texel in entry.memory[range].chunks_exact_mut(bpp) {
                memory::write_depth_stencil(texel, view.format, flags, depth, stencil);
            }
        }
        Ok(())
    }

    fn clear_unordered_access(
        &mut self,
        uav: ResourceViewHandle,
        raw: Option<Vec<u8>>,
        pack: impl Fn(Format) -> Option<Vec<u8>>,
    ) -> Result<(), String> {
        let view = view(self.device, uav)?;
        if view.usage_type != ResourceUsage::UNORDERED_ACCESS {
            return Err(format!("{uav:?} is not an unordered access view"));
        }
        let texel = match view.format {
            Format::Unknown => raw,
            format => pack(format),
        }
        .ok_or_else(|| format!("{:?} cannot be cleared", view.format))?;
        let mut resources = lock(&self.device.internal.resources);
        let entry = entry_mut(&mut resources, view.resource)?;
        if entry.desc.is_buffer() {
            let range = byte_range(view.buffer_offset, view.buffer_size, entry.memory.len())?;
            for chunk in entry.memory[range].chunks_exact_mut(texel.len()) {
                chunk.copy_from_slice(&texel);
            }
        } else {
            for sub in view.subresources(entry.desc.mip_levels()) {
                entry.fill(sub, &texel);
            }
        }
        Ok(())
    }

    // --- Queries ---

    fn with_slot<R>(
        &self,
        pool: QueryPoolHandle,
        query_type: QueryType,
        index: u32,
        f: impl FnOnce(&mut QuerySlot) -> R,
    ) -> Result<R, String> {
        let mut pools = lock(&self.device.internal.query_pools);
        let entry = pools
            .get_mut(&pool)
            .ok_or_else(|| format!("unknown query pool {pool:?}"))?;
        if entry.query_type != query_type {
            return Err(format!("{pool:?} holds {:?} queries", entry.query_type));
        }
        let slot = entry
            .slots
            .get_mut(index as usize)
            .ok_or_else(|| format!("query {index} out of range"))?;
        Ok(f(slot))
    }

    fn begin_query(&mut self, pool: QueryPoolHandle, query_type: QueryType, index: u32) -> Result<(), String> {
        if !query_type.is_scoped() {
            return Err("timestamps are written by finish_query alone".into());
        }
        if self
            .active_queries
            .iter()
            .any(|q| q.pool == pool && q.index == index)
        {
            return Err(format!("query {index} of {pool:?} is already active"));
        }
        self.with_slot(pool, query_type, index, |slot| slot.available = false)?;
        self.active_queries.push(ActiveQuery {
            pool,
            index,
            query_type,
            values: [0; STATISTICS_COUNTERS],
        });
        Ok(())
    }

    fn finish_query(&mut self, pool: QueryPoolHandle, query_type: QueryType, index: u32) -> Result<(), String> {
        let mut values = [0; STATISTICS_COUNTERS];
        if query_type == QueryType::Timestamp {
            values[0] = u64::try_from(self.device.internal.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        } else {
            let position = self
                .active_queries
                .iter()
                .position(|q| q.pool == pool && q.index == index)
                .ok_or_else(|| format!("query {index} of {pool:?} was never begun"))?;
            values = self.active_queries.remove(position).values;
            if query_type == QueryType::BinaryOcclusion {
                values[0] = u64::from(values[0] != 0);
            }
        }
        self.with_slot(pool, query_type, index, |slot| {
            slot.values = values;
            slot.available = true;
        })
    }

    fn copy_query_results(
        &mut self,
        (pool, query_type, first, count): (QueryPoolHandle, QueryType, u32, u32),
        destination: ResourceHandle,
        destination_offset: u64,
        stride: u32,
    ) -> Result<(), String> {
        let device = self.device;
        gate(device, DeviceCaps::CopyQueryResults)?;
        if stride < query_type.result_size() {
            return Err(format!("stride {stride} below the result size"));
        }
        let slots = {
            let pools = lock(&device.internal.query_pools);
            let entry = pools
                .get(&pool)
                .ok_or_else(|| format!("unknown query pool {pool:?}"))?;
            if entry.query_type != query_type {
                return Err(format!("{pool:?} holds {:?} queries", entry.query_type));
            }
            entry
                .slots
                .get(first as usize..first as usize + count as usize)
                .ok_or_else(|| format!("queries {first}+{count} out of range"))?
                .to_vec()
        };
        let mut resources = lock(&device.internal.resources);
        let dst = entry_mut(&mut resources, destination)?;
        note_state(device, destination, dst.state, ResourceUsage::COPY_DEST, "copy_query_results");
        let span = u64::from(count) * u64::from(stride);
        let range = byte_range(destination_offset, span, dst.memory.len())?;
        for (slot, out) in slots.iter().zip(dst.memory[range].chunks_exact_mut(stride as usize)) {
            slot.write_result(query_type, out);
        }
        Ok(())
    }
}
