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
use crate::api::caps::{DeviceApi, DeviceCaps};
use crate::api::descriptor::{ConstantRange, DescriptorRange, DescriptorUpdate};
use crate::api::format::Format;
use crate::api::handle::*;
use crate::api::pipeline::{PipelineDesc, PipelineType};
use crate::api::query::QueryType;
use crate::api::resource::{
    MapAccess, MappedSubresource, ResourceDesc, ResourceUsage, ResourceViewDesc, SamplerDesc,
    SubresourceBox, SubresourceData,
};
use crate::error::{MapError, ResourceError};
use std::fmt::Debug;

/// The factory and bookkeeping authority for one logical GPU context.
///
/// Every creation call either returns a valid, non-zero handle or an error; a
/// failed call leaves nothing reachable on the device. Destroying a handle
/// twice is outside the contract.
///
/// Capability queries are pure. Callers consult them before using gated
/// operations; the device does not re-check capabilities when those
/// operations are recorded.
pub trait Device: ApiObject + Send + Sync + Debug {
    /// The native API this device fronts.
    fn api(&self) -> DeviceApi;

    /// `true` when the device exposes `capability`.
    fn check_capability(&self, capability: DeviceCaps) -> bool;

    /// `true` when `format` can be used for every usage in `usage`.
    fn check_format_support(&self, format: Format, usage: ResourceUsage) -> bool;

    /// Creates a sampler state object.
    fn create_sampler(&self, desc: &SamplerDesc) -> Result<SamplerHandle, ResourceError>;

    /// Destroys a sampler.
    fn destroy_sampler(&self, sampler: SamplerHandle);

    /// Creates a buffer or texture.
    ///
    /// ## Arguments
    /// * `desc` - Dimensions, format, heap and allowed usages.
    /// * `initial_data` - Optional contents, one entry per subresource.
    /// * `initial_state` - The state the caller will pass as `old_state` to the first barrier.
    fn create_resource(
        &self,
        desc: &ResourceDesc,
        initial_data: Option<&[SubresourceData<'_>]>,
        initial_state: ResourceUsage,
    ) -> Result<ResourceHandle, ResourceError>;

    /// Destroys a resource. Views created from it are not destroyed.
    fn destroy_resource(&self, resource: ResourceHandle);

    /// Creates a view of `resource` for exactly one usage type.
    ///
    /// ## Arguments
    /// * `usage_type` - One of render target, depth-stencil, shader resource or unordered access.
    fn create_resource_view(
        &self,
        resource: ResourceHandle,
        usage_type: ResourceUsage,
        desc: &ResourceViewDesc,
    ) -> Result<ResourceViewHandle, ResourceError>;

    /// Destroys a resource view.
    fn destroy_resource_view(&self, view: ResourceViewHandle);

    /// Creates a graphics or compute pipeline.
    fn create_pipeline(&self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle, ResourceError>;

    /// Destroys a pipeline created with the given type.
    fn destroy_pipeline(&self, pipeline_type: PipelineType, pipeline: PipelineHandle);

    /// Creates a pipeline layout from descriptor set layouts and push constant ranges.
    fn create_pipeline_layout(
        &self,
        set_layouts: &[DescriptorSetLayoutHandle],
        constant_ranges: &[ConstantRange],
    ) -> Result<PipelineLayoutHandle, ResourceError>;

    /// Destroys a pipeline layout.
    fn destroy_pipeline_layout(&self, layout: PipelineLayoutHandle);

    /// Creates a descriptor set layout.
    ///
    /// Layouts created with `push_descriptors` are only used with
    /// `CommandList::push_descriptors` and cannot back allocated sets.
    fn create_descriptor_set_layout(
        &self,
        ranges: &[DescriptorRange],
        push_descriptors: bool,
    ) -> Result<DescriptorSetLayoutHandle, ResourceError>;

    /// Destroys a descriptor set layout.
    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle);

    /// Creates a pool of `count` queries of one type.
    fn create_query_pool(
        &self,
        query_type: QueryType,
        count: u32,
    ) -> Result<QueryPoolHandle, ResourceError>;

    /// Destroys a query pool.
    fn destroy_query_pool(&self, pool: QueryPoolHandle);

    /// Allocates `count` descriptor sets conforming to `layout`.
    ///
    /// Either every set is allocated or none is.
    fn create_descriptor_sets(
        &self,
        layout: DescriptorSetLayoutHandle,
        count: u32,
    ) -> Result<Vec<DescriptorSetHandle>, ResourceError>;

    /// Frees descriptor sets allocated from `layout`.
    fn destroy_descriptor_sets(
        &self,
        layout: DescriptorSetLayoutHandle,
        sets: &[DescriptorSetHandle],
    );

    /// `true` while `handle` names a live sampler.
    fn is_sampler_handle_valid(&self, handle: SamplerHandle) -> bool;
    /// `true` while `handle` names a live resource.
    fn is_resource_handle_valid(&self, handle: ResourceHandle) -> bool;
    /// `true` while `handle` names a live resource view.
    fn is_resource_view_handle_valid(&self, handle: ResourceViewHandle) -> bool;
    /// `true` while `handle` names a live pipeline.
    fn is_pipeline_handle_valid(&self, handle: PipelineHandle) -> bool;
    /// `true` while `handle` names a live pipeline layout.
    fn is_pipeline_layout_handle_valid(&self, handle: PipelineLayoutHandle) -> bool;
    /// `true` while `handle` names a live descriptor set layout.
    fn is_descriptor_set_layout_handle_valid(&self, handle: DescriptorSetLayoutHandle) -> bool;
    /// `true` while `handle` names a live descriptor set.
    fn is_descriptor_set_handle_valid(&self, handle: DescriptorSetHandle) -> bool;
    /// `true` while `handle` names a live query pool.
    fn is_query_pool_handle_valid(&self, handle: QueryPoolHandle) -> bool;

    /// The resource a view was created against, or `NONE` for unknown views.
    fn get_resource_from_view(&self, view: ResourceViewHandle) -> ResourceHandle;

    /// The description a resource was created with.
    fn get_resource_desc(&self, resource: ResourceHandle) -> Option<ResourceDesc>;

    /// Maps one subresource for CPU access.
    ///
    /// Each (resource, subresource) pair follows strict stack discipline: it
    /// must be unmapped before being mapped again.
    fn map_resource(
        &self,
        resource: ResourceHandle,
        subresource: u32,
        access: MapAccess,
    ) -> Result<MappedSubresource, MapError>;

    /// Ends CPU access started by [`map_resource`](Self::map_resource).
    fn unmap_resource(&self, resource: ResourceHandle, subresource: u32);

    /// Writes `data` into a buffer at `offset`, bypassing command lists.
    fn upload_buffer_region(&self, data: &[u8], destination: ResourceHandle, offset: u64);

    /// Writes texel data into a texture subresource, bypassing command lists.
    ///
    /// ## Arguments
    /// * `dst_box` - Region to write, `None` for the whole subresource.
    fn upload_texture_region(
        &self,
        data: &SubresourceData<'_>,
        destination: ResourceHandle,
        subresource: u32,
        dst_box: Option<&SubresourceBox>,
    );

    /// Applies a batch of descriptor writes.
    ///
    /// The batch is atomic from the reader's point of view: no reader observes
    /// some writes of the batch without the others.
    fn update_descriptor_sets(&self, updates: &[DescriptorUpdate<'_>]);

    /// Copies query results into `results`.
    ///
    /// ## Returns
    /// `false`, with `results` untouched, when any requested query has not
    /// completed yet. Otherwise `true`, with exactly `count * stride` bytes
    /// written.
    fn get_query_results(
        &self,
        pool: QueryPoolHandle,
        first: u32,
        count: u32,
        results: &mut [u8],
        stride: u32,
    ) -> bool;

    /// Attaches a debug name to a resource.
    fn set_debug_name(&self, resource: ResourceHandle, name: &str);

    /// Blocks until every submitted piece of work has completed.
    fn wait_idle(&self);
}
