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

use prism_core::api::caps::DeviceApi;
use prism_core::api::descriptor::{
    ConstantRange, Descriptor, DescriptorRange, DescriptorType, DescriptorUpdate, ShaderStage,
};
use prism_core::api::format::Format;
use prism_core::api::handle::{DescriptorSetLayoutHandle, ResourceHandle, ResourceViewHandle};
use prism_core::api::indirect::{DispatchIndirectArgs, DrawIndexedIndirectArgs, DrawIndirectArgs};
use prism_core::api::pipeline::{ComputePipelineDesc, PipelineDesc, PipelineType, ShaderDesc};
use prism_core::api::query::QueryType;
use prism_core::api::render::ClearFlags;
use prism_core::api::resource::{
    MemoryHeap, ResourceDesc, ResourceUsage, ResourceViewDesc, SamplerDesc, SubresourceBox,
    SubresourceData, TextureFilter,
};
use prism_core::traits::{CommandList, CommandQueue, Device};
use prism_infra::{ExecutedOp, SoftCommandList, SoftCommandQueue, SoftDevice, SoftDeviceConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::borrow::Cow;
use std::sync::Arc;
use std::thread;

fn setup(api: DeviceApi) -> (SoftDevice, SoftCommandQueue) {
    let device = SoftDevice::new(SoftDeviceConfig::for_api(api));
    let queue = SoftCommandQueue::new(device.clone());
    (device, queue)
}

fn buffer(device: &SoftDevice, size: u64, usage: ResourceUsage, data: Option<&[u8]>) -> ResourceHandle {
    let desc = ResourceDesc::buffer(size, MemoryHeap::GpuOnly, usage);
    let initial = data.map(|bytes| [SubresourceData::packed(bytes, 0, 0)]);
    device
        .create_resource(&desc, initial.as_ref().map(|d| &d[..]), usage)
        .expect("buffer creation should succeed")
}

fn texture(
    device: &SoftDevice,
    (width, height, levels): (u32, u32, u16),
    format: Format,
    usage: ResourceUsage,
    data: Option<&[u8]>,
) -> ResourceHandle {
    let desc = ResourceDesc::texture_2d(width, height, 1, levels, format, MemoryHeap::GpuOnly, usage);
    let initial = data.map(|bytes| [SubresourceData::packed(bytes, 0, 0)]);
    device
        .create_resource(&desc, initial.as_ref().map(|d| &d[..]), ResourceUsage::COPY_DEST)
        .expect("texture creation should succeed")
}

fn srv_set_layout(device: &SoftDevice, count: u32) -> DescriptorSetLayoutHandle {
    device
        .create_descriptor_set_layout(
            &[DescriptorRange {
                binding: 0,
                dx_register_index: 0,
                dx_register_space: 0,
                count,
                visibility: ShaderStage::ALL,
                descriptor_type: DescriptorType::ShaderResourceView,
            }],
            false,
        )
        .expect("set layout creation should succeed")
}

fn compute_desc(layout: prism_core::api::handle::PipelineLayoutHandle) -> PipelineDesc<'static> {
    PipelineDesc::Compute(ComputePipelineDesc {
        layout,
        shader: ShaderDesc {
            code: Cow::Borrowed(&[0x03, 0x02, 0x23, 0x07]),
            entry_point: None,
        },
    })
}

#[test]
fn test_query_results_become_available_after_execution() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::Vulkan);
    let pool = device.create_query_pool(QueryType::Occlusion, 1).unwrap();
    let list = queue.get_immediate_command_list();
    list.begin_query(pool, QueryType::Occlusion, 0);
    list.draw(6, 2, 0, 0);
    list.finish_query(pool, QueryType::Occlusion, 0);

    let mut results = [0xaa_u8; 16];
    assert!(
        !device.get_query_results(pool, 0, 1, &mut results, 16),
        "Results must not be available before the queue ran"
    );
    assert_eq!(results, [0xaa; 16], "A failed read must leave the buffer untouched");

    // --- 2. ACT ---
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert!(device.get_query_results(pool, 0, 1, &mut results, 16));
    assert_eq!(u64::from_le_bytes(results[..8].try_into().unwrap()), 12);
    assert_eq!(&results[8..], &[0; 8], "Padding up to the stride is zeroed");
    assert!(
        !device.get_query_results(pool, 0, 1, &mut results[..4], 8),
        "A buffer shorter than count * stride is rejected"
    );
}

#[test]
fn test_timestamps_are_monotonic() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::D3D12);
    let pool = device.create_query_pool(QueryType::Timestamp, 2).unwrap();
    let list = queue.get_immediate_command_list();
    list.finish_query(pool, QueryType::Timestamp, 0);
    list.draw(3, 1, 0, 0);
    list.finish_query(pool, QueryType::Timestamp, 1);

    // --- 2. ACT ---
    queue.wait_idle();

    // --- 3. ASSERT ---
    let mut results = [0u8; 16];
    assert!(device.get_query_results(pool, 0, 2, &mut results, 8));
    let first = u64::from_le_bytes(results[..8].try_into().unwrap());
    let second = u64::from_le_bytes(results[8..].try_into().unwrap());
    assert!(second >= first);
}

#[test]
fn test_indirect_tags_read_native_argument_layouts() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::Vulkan);
    let mut args = Vec::new();
    args.extend_from_slice(bytemuck::bytes_of(&DrawIndirectArgs {
        vertex_count: 3,
        instance_count: 1,
        first_vertex: 0,
        first_instance: 0,
    }));
    args.extend_from_slice(bytemuck::bytes_of(&DrawIndexedIndirectArgs {
        index_count: 6,
        instance_count: 2,
        first_index: 1,
        vertex_offset: -2,
        first_instance: 0,
    }));
    args.extend_from_slice(bytemuck::bytes_of(&DispatchIndirectArgs {
        group_count_x: 4,
        group_count_y: 2,
        group_count_z: 1,
    }));
    let buffer = buffer(&device, args.len() as u64, ResourceUsage::INDIRECT_ARGUMENT, Some(&args));

    // --- 2. ACT ---
    let list = queue.get_immediate_command_list();
    let accepted = [
        list.draw_or_dispatch_indirect_raw(1, buffer, 0, 1, 0),
        list.draw_or_dispatch_indirect_raw(2, buffer, 16, 1, 0),
        list.draw_or_dispatch_indirect_raw(3, buffer, 36, 1, 0),
        list.draw_or_dispatch_indirect_raw(4, buffer, 0, 1, 0),
    ];
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert_eq!(accepted, [true, true, true, false], "Only tags 1 to 3 are known");
    let ops = device.executed_ops();
    assert_eq!(ops.len(), 3, "The unknown tag records nothing: {ops:?}");
    assert!(matches!(ops[0], ExecutedOp::Draw { vertex_count: 3, .. }));
    assert!(matches!(
        ops[1],
        ExecutedOp::DrawIndexed {
            index_count: 6,
            instance_count: 2,
            vertex_offset: -2,
            ..
        }
    ));
    assert!(matches!(ops[2], ExecutedOp::Dispatch { x: 4, y: 2, z: 1, .. }));
}

#[test]
fn test_missing_capabilities_turn_commands_into_no_ops() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::D3D9);
    let list = queue.get_immediate_command_list();
    list.dispatch(1, 1, 1);
    list.draw(3, 1, 0, 0);

    // --- 2. ACT ---
    queue.wait_idle();

    // --- 3. ASSERT ---
    let ops = device.executed_ops();
    assert!(matches!(
        &ops[0],
        ExecutedOp::Skipped { operation: "dispatch", .. }
    ));
    assert!(matches!(ops[1], ExecutedOp::Draw { .. }), "Later commands still run");
}

#[test]
fn test_copies_without_transitions_are_executed_and_counted() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::Vulkan);
    let usage = ResourceUsage::COPY_SOURCE | ResourceUsage::COPY_DEST | ResourceUsage::VERTEX_BUFFER;
    let src = buffer(&device, 8, usage, Some(&[1, 2, 3, 4, 5, 6, 7, 8]));
    let dst = buffer(&device, 8, usage, None);

    // --- 2. ACT ---
    let list = queue.get_immediate_command_list();
    list.barrier(
        &[src, dst],
        &[usage, usage],
        &[ResourceUsage::VERTEX_BUFFER, ResourceUsage::COPY_DEST],
    );
    list.copy_buffer_region(src, 2, dst, 0, 4);
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert_eq!(device.hazard_count(), 1, "Only the source was in the wrong state");
    assert_eq!(device.read_subresource(dst, 0).unwrap(), vec![3, 4, 5, 6, 0, 0, 0, 0]);
    assert_eq!(device.resource_state(src), Some(ResourceUsage::VERTEX_BUFFER));
}

#[test]
fn test_texture_region_travels_through_a_staging_buffer() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::Vulkan);
    let pixels: Vec<u8> = (0..16).collect();
    let staging = buffer(
        &device,
        64,
        ResourceUsage::COPY_SOURCE | ResourceUsage::COPY_DEST,
        Some(&pixels),
    );
    let image = texture(
        &device,
        (4, 4, 1),
        Format::R8Unorm,
        ResourceUsage::SHADER_RESOURCE | ResourceUsage::COPY_SOURCE | ResourceUsage::COPY_DEST,
        None,
    );
    let bottom_right = SubresourceBox {
        left: 2,
        top: 2,
        front: 0,
        right: 4,
        bottom: 4,
        back: 1,
    };

    // --- 2. ACT ---
    let list = queue.get_immediate_command_list();
    list.copy_buffer_to_texture(staging, 0, 0, 0, image, 0, None);
    list.barrier_one(image, ResourceUsage::COPY_DEST, ResourceUsage::COPY_SOURCE);
    list.copy_texture_to_buffer(image, 0, Some(&bottom_right), staging, 32, 0, 0);
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert_eq!(device.read_subresource(image, 0).unwrap(), pixels);
    let staged = device.read_subresource(staging, 0).unwrap();
    assert_eq!(&staged[32..36], &[10, 11, 14, 15]);
    assert_eq!(device.hazard_count(), 0);
}

#[test]
fn test_mip_generation_averages_each_level() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::Vulkan);
    let image = texture(
        &device,
        (2, 2, 2),
        Format::R8Unorm,
        ResourceUsage::SHADER_RESOURCE | ResourceUsage::RENDER_TARGET,
        Some(&[0, 100, 200, 40]),
    );
    let srv = device
        .create_resource_view(
            image,
            ResourceUsage::SHADER_RESOURCE,
            &ResourceViewDesc::texture_2d(Format::Unknown),
        )
        .unwrap();

    // --- 2. ACT ---
    queue.get_immediate_command_list().generate_mipmaps(srv);
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert_eq!(device.read_subresource(image, 1).unwrap(), vec![85]);
}

#[test]
fn test_scaled_copy_samples_nearest_texels() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::OpenGL);
    let usage = ResourceUsage::SHADER_RESOURCE | ResourceUsage::COPY_SOURCE | ResourceUsage::COPY_DEST;
    let small = texture(&device, (2, 2, 1), Format::R8Unorm, usage, Some(&[1, 2, 3, 4]));
    let large = texture(&device, (4, 4, 1), Format::R8Unorm, usage, None);

    // --- 2. ACT ---
    let list = queue.get_immediate_command_list();
    list.barrier_one(small, ResourceUsage::COPY_DEST, ResourceUsage::COPY_SOURCE);
    list.copy_texture_region(
        small,
        0,
        None,
        large,
        0,
        Some(&SubresourceBox::covering(4, 4, 1)),
        TextureFilter::MinMagMipPoint,
    );
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert_eq!(
        device.read_subresource(large, 0).unwrap(),
        vec![1, 1, 2, 2, 1, 1, 2, 2, 3, 3, 4, 4, 3, 3, 4, 4]
    );
}

#[test]
fn test_depth_stencil_clear_writes_both_aspects() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::D3D11);
    let depth = texture(
        &device,
        (2, 1, 1),
        Format::D24UnormS8Uint,
        ResourceUsage::DEPTH_STENCIL,
        None,
    );
    let dsv = device
        .create_resource_view(
            depth,
            ResourceUsage::DEPTH_STENCIL,
            &ResourceViewDesc::texture_2d(Format::Unknown),
        )
        .unwrap();

    // --- 2. ACT ---
    queue
        .get_immediate_command_list()
        .clear_depth_stencil_view(dsv, ClearFlags::DEPTH | ClearFlags::STENCIL, 1.0, 0x7f);
    queue.wait_idle();

    // --- 3. ASSERT ---
    let bytes = device.read_subresource(depth, 0).unwrap();
    for texel in bytes.chunks_exact(4) {
        assert_eq!(u32::from_le_bytes(texel.try_into().unwrap()), 0x7fff_ffff);
    }
}

#[test]
fn test_descriptor_batches_are_atomic_for_concurrent_readers() {
    // --- 1. ARRANGE ---
    const SLOTS: u32 = 32;
    let (device, _queue) = setup(DeviceApi::Vulkan);
    let layout = device
        .create_descriptor_set_layout(
            &[DescriptorRange {
                binding: 0,
                dx_register_index: 0,
                dx_register_space: 0,
                count: SLOTS,
                visibility: ShaderStage::ALL,
                descriptor_type: DescriptorType::ShaderResourceView,
            }],
            false,
        )
        .unwrap();
    let set = device.create_descriptor_sets(layout, 1).unwrap()[0];
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let device = device.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut snapshots = 0;
            while !done.load(Ordering::Acquire) {
                let slots = device.descriptor_set_contents(set).unwrap();
                assert!(
                    slots.iter().all(|s| *s == slots[0]),
                    "A reader observed a partially applied batch: {slots:?}"
                );
                snapshots += 1;
            }
            snapshots
        })
    };

    // --- 2. ACT ---
    for round in 1..=200u64 {
        let descriptors: Vec<_> = (0..SLOTS)
            .map(|_| [Descriptor::ShaderResourceView(ResourceViewHandle(round))])
            .collect();
        let updates: Vec<_> = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| DescriptorUpdate {
                set,
                binding: 0,
                array_offset: i as u32,
                descriptors: d,
            })
            .collect();
        device.update_descriptor_sets(&updates);
    }
    done.store(true, Ordering::Release);

    // --- 3. ASSERT ---
    reader.join().expect("reader thread panicked");
    let last = device.descriptor_set_contents(set).unwrap();
    assert!(last
        .iter()
        .all(|s| *s == Some(Descriptor::ShaderResourceView(ResourceViewHandle(200)))));
}

#[test]
fn test_separately_recorded_list_closes_an_open_pass() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::Vulkan);
    let mut list = SoftCommandList::new(device.clone());
    list.begin_render_pass(&[], ResourceViewHandle::NONE);
    list.draw(3, 1, 0, 0);

    // --- 2. ACT ---
    queue.execute_command_list(&mut list);
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert_eq!(list.violation_count(), 1);
    assert_eq!(device.executed_ops().len(), 1);
}

#[test]
fn test_unordered_access_barrier_is_not_a_transition() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::D3D12);
    let usage = ResourceUsage::UNORDERED_ACCESS | ResourceUsage::SHADER_RESOURCE;
    let storage = buffer(&device, 16, ResourceUsage::UNORDERED_ACCESS, None);
    let sampled = buffer(&device, 16, usage, None);

    // --- 2. ACT ---
    let list = queue.get_immediate_command_list();
    list.barrier(
        &[storage, sampled],
        &[ResourceUsage::UNORDERED_ACCESS, ResourceUsage::UNORDERED_ACCESS],
        &[ResourceUsage::UNORDERED_ACCESS, ResourceUsage::SHADER_RESOURCE],
    );
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert_eq!(
        device.executed_ops(),
        vec![
            ExecutedOp::UnorderedAccessBarrier { resource: storage },
            ExecutedOp::Transition {
                resource: sampled,
                old: ResourceUsage::UNORDERED_ACCESS,
                new: ResourceUsage::SHADER_RESOURCE,
            },
        ],
        "Equal unordered-access states must be told apart from a transition"
    );
    assert_eq!(device.resource_state(storage), Some(ResourceUsage::UNORDERED_ACCESS));
    assert_eq!(device.resource_state(sampled), Some(ResourceUsage::SHADER_RESOURCE));
}

#[test]
fn test_query_results_write_exactly_count_times_stride_bytes() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::Vulkan);
    let pool = device.create_query_pool(QueryType::Occlusion, 2).unwrap();
    let list = queue.get_immediate_command_list();
    for index in 0..2 {
        list.begin_query(pool, QueryType::Occlusion, index);
        list.draw(3, 1, 0, 0);
        list.finish_query(pool, QueryType::Occlusion, index);
    }
    queue.wait_idle();
    let mut results = [0xee_u8; 40];

    // --- 2. ACT ---
    let ready = device.get_query_results(pool, 0, 2, &mut results, 12);

    // --- 3. ASSERT ---
    assert!(ready);
    assert_eq!(u64::from_le_bytes(results[..8].try_into().unwrap()), 3);
    assert_eq!(u64::from_le_bytes(results[12..20].try_into().unwrap()), 3);
    assert_eq!(&results[24..], &[0xee; 16], "Bytes past count * stride must be untouched");
}

#[test]
fn test_every_handle_kind_is_valid_until_destroyed() {
    // --- 1. ARRANGE ---
    let (device, _queue) = setup(DeviceApi::Vulkan);
    let sampler = device.create_sampler(&SamplerDesc::default()).unwrap();
    let image = texture(&device, (4, 4, 1), Format::R8Unorm, ResourceUsage::SHADER_RESOURCE, None);
    let view = device
        .create_resource_view(
            image,
            ResourceUsage::SHADER_RESOURCE,
            &ResourceViewDesc::texture_2d(Format::Unknown),
        )
        .unwrap();
    let set_layout = srv_set_layout(&device, 1);
    let layout = device.create_pipeline_layout(&[set_layout], &[]).unwrap();
    let pipeline = device.create_pipeline(&compute_desc(layout)).unwrap();
    let sets = device.create_descriptor_sets(set_layout, 2).unwrap();
    let pool = device.create_query_pool(QueryType::Timestamp, 4).unwrap();

    assert!(device.is_sampler_handle_valid(sampler));
    assert!(device.is_resource_view_handle_valid(view));
    assert!(device.is_pipeline_handle_valid(pipeline));
    assert!(device.is_pipeline_layout_handle_valid(layout));
    assert!(device.is_descriptor_set_layout_handle_valid(set_layout));
    assert!(sets.iter().all(|s| device.is_descriptor_set_handle_valid(*s)));
    assert!(device.is_query_pool_handle_valid(pool));

    // --- 2. ACT ---
    device.destroy_sampler(sampler);
    device.destroy_resource_view(view);
    device.destroy_pipeline(PipelineType::Compute, pipeline);
    device.destroy_descriptor_sets(set_layout, &sets);
    device.destroy_pipeline_layout(layout);
    device.destroy_descriptor_set_layout(set_layout);
    device.destroy_query_pool(pool);

    // --- 3. ASSERT ---
    assert!(!device.is_sampler_handle_valid(sampler));
    assert!(!device.is_resource_view_handle_valid(view));
    assert!(!device.is_pipeline_handle_valid(pipeline));
    assert!(!device.is_pipeline_layout_handle_valid(layout));
    assert!(!device.is_descriptor_set_layout_handle_valid(set_layout));
    assert!(sets.iter().all(|s| !device.is_descriptor_set_handle_valid(*s)));
    assert!(!device.is_query_pool_handle_valid(pool));
    assert!(device.is_resource_handle_valid(image), "The viewed resource outlives its view");
}

#[test]
fn test_destroying_twice_is_an_ignored_no_op() {
    // --- 1. ARRANGE ---
    let (device, _queue) = setup(DeviceApi::Vulkan);
    let doomed = buffer(&device, 64, ResourceUsage::COPY_DEST, None);
    let survivor = buffer(&device, 32, ResourceUsage::COPY_DEST, None);
    let pool = device.create_query_pool(QueryType::Occlusion, 1).unwrap();
    device.destroy_resource(doomed);
    device.destroy_query_pool(pool);
    let bytes_after_first = device.allocated_bytes();

    // --- 2. ACT ---
    device.destroy_resource(doomed);
    device.destroy_query_pool(pool);

    // --- 3. ASSERT ---
    assert_eq!(device.allocated_bytes(), bytes_after_first, "Memory is released only once");
    assert_eq!(device.resource_count(), 1);
    assert!(device.is_resource_handle_valid(survivor));
    assert!(!device.is_resource_handle_valid(doomed));
}

#[test]
fn test_indirect_records_advance_by_stride() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::Vulkan);
    let mut args = vec![0u8; 48];
    for (offset, vertex_count) in [(8, 5u32), (28, 7)] {
        let record = DrawIndirectArgs {
            vertex_count,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        };
        args[offset..offset + 16].copy_from_slice(bytemuck::bytes_of(&record));
    }
    let buffer = buffer(&device, 48, ResourceUsage::INDIRECT_ARGUMENT, Some(&args));

    // --- 2. ACT ---
    let accepted = queue
        .get_immediate_command_list()
        .draw_or_dispatch_indirect_raw(1, buffer, 8, 2, 20);
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert!(accepted);
    let ops = device.executed_ops();
    assert_eq!(ops.len(), 2, "One draw per record: {ops:?}");
    assert!(matches!(ops[0], ExecutedOp::Draw { vertex_count: 5, .. }));
    assert!(matches!(ops[1], ExecutedOp::Draw { vertex_count: 7, .. }));
}

#[test]
fn test_sets_bound_through_a_foreign_layout_are_skipped() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::Vulkan);
    let set_layout = srv_set_layout(&device, 1);
    let constants = ConstantRange {
        offset: 0,
        dx_register_index: 0,
        dx_register_space: 0,
        count: 4,
        visibility: ShaderStage::ALL,
    };
    let own = device.create_pipeline_layout(&[set_layout], &[]).unwrap();
    let foreign = device.create_pipeline_layout(&[set_layout], &[constants]).unwrap();
    let pipeline = device.create_pipeline(&compute_desc(own)).unwrap();
    let set = device.create_descriptor_sets(set_layout, 1).unwrap()[0];

    // --- 2. ACT ---
    let list = queue.get_immediate_command_list();
    list.bind_pipeline(PipelineType::Compute, pipeline);
    list.bind_descriptor_sets(PipelineType::Compute, own, 0, &[set]);
    list.bind_descriptor_sets(PipelineType::Compute, foreign, 0, &[set]);
    queue.wait_idle();

    // --- 3. ASSERT ---
    let ops = device.executed_ops();
    assert_eq!(ops.len(), 1, "Only the mismatched bind is reported: {ops:?}");
    assert!(matches!(
        &ops[0],
        ExecutedOp::Skipped { operation: "bind_descriptor_sets", .. }
    ));
}

#[test]
fn test_depth_stencil_clear_without_aspects_leaves_memory_alone() {
    // --- 1. ARRANGE ---
    let (device, mut queue) = setup(DeviceApi::D3D11);
    let depth = texture(
        &device,
        (2, 1, 1),
        Format::D24UnormS8Uint,
        ResourceUsage::DEPTH_STENCIL,
        Some(&[1, 2, 3, 4, 5, 6, 7, 8]),
    );
    let dsv = device
        .create_resource_view(
            depth,
            ResourceUsage::DEPTH_STENCIL,
            &ResourceViewDesc::texture_2d(Format::Unknown),
        )
        .unwrap();

    // --- 2. ACT ---
    queue
        .get_immediate_command_list()
        .clear_depth_stencil_view(dsv, ClearFlags::EMPTY, 1.0, 0xff);
    queue.wait_idle();

    // --- 3. ASSERT ---
    assert_eq!(device.read_subresource(depth, 0).unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
}
