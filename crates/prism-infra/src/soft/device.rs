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

//! The software [`Device`] implementation.

use super::config::SoftDeviceConfig;
use super::executor::{self, ExecutedOp};
use super::lock;
use super::memory::ResourceEntry;
use super::command::Command;
use prism_core::api::caps::{DeviceApi, DeviceCaps};
use prism_core::api::descriptor::{
    ConstantRange, Descriptor, DescriptorRange, DescriptorType, DescriptorUpdate,
};
use prism_core::api::format::Format;
use prism_core::api::handle::*;
use prism_core::api::pipeline::{PipelineDesc, PipelineType};
use prism_core::api::query::QueryType;
use prism_core::api::resource::{
    MapAccess, MappedSubresource, ResourceDesc, ResourceType, ResourceUsage, ResourceViewDesc,
    ResourceViewType, SamplerDesc, SubresourceBox, SubresourceData,
};
use prism_core::api::user_data::UserDataSlots;
use prism_core::error::{MapError, ResourceError};
use prism_core::traits::{ApiObject, Device};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Number of 64-bit counters in a pipeline statistics result.
pub(crate) const STATISTICS_COUNTERS: usize = 11;

const VIEW_KINDS: [ResourceUsage; 6] = [
    ResourceUsage::RENDER_TARGET,
    ResourceUsage::DEPTH_STENCIL,
    ResourceUsage::DEPTH_STENCIL_READ,
    ResourceUsage::DEPTH_STENCIL_WRITE,
    ResourceUsage::SHADER_RESOURCE,
    ResourceUsage::UNORDERED_ACCESS,
];

fn buffer_usages() -> ResourceUsage {
    ResourceUsage::INDEX_BUFFER
        | ResourceUsage::VERTEX_BUFFER
        | ResourceUsage::CONSTANT_BUFFER
        | ResourceUsage::INDIRECT_ARGUMENT
        | ResourceUsage::SHADER_RESOURCE
        | ResourceUsage::UNORDERED_ACCESS
        | transfer_usages()
}

fn transfer_usages() -> ResourceUsage {
    ResourceUsage::COPY_DEST
        | ResourceUsage::COPY_SOURCE
        | ResourceUsage::RESOLVE_DEST
        | ResourceUsage::RESOLVE_SOURCE
        | ResourceUsage::CPU_ACCESS
}

/// A view and the subresource range it resolved to at creation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ViewEntry {
    pub(crate) resource: ResourceHandle,
    pub(crate) usage_type: ResourceUsage,
    pub(crate) format: Format,
    pub(crate) first_level: u32,
    pub(crate) levels: u32,
    pub(crate) first_layer: u32,
    pub(crate) layers: u32,
    pub(crate) buffer_offset: u64,
    pub(crate) buffer_size: u64,
}

impl ViewEntry {
    /// Every subresource index the view covers, given the resource's level count.
    pub(crate) fn subresources(&self, mip_levels: u32) -> impl Iterator<Item = u32> {
        let (first_level, levels) = (self.first_level, self.levels);
        (self.first_layer..self.first_layer + self.layers).flat_map(move |layer| {
            (first_level..first_level + levels).map(move |level| level + layer * mip_levels)
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PipelineEntry {
    pub(crate) pipeline_type: PipelineType,
    pub(crate) layout: PipelineLayoutHandle,
}

#[derive(Debug)]
pub(crate) struct PipelineLayoutEntry {
    pub(crate) set_layouts: Vec<DescriptorSetLayoutHandle>,
    pub(crate) constant_ranges: Vec<ConstantRange>,
}

#[derive(Debug)]
pub(crate) struct SetLayoutEntry {
    pub(crate) ranges: Arc<[DescriptorRange]>,
    pub(crate) push_descriptors: bool,
}

#[derive(Debug)]
pub(crate) struct DescriptorSetEntry {
    pub(crate) layout: DescriptorSetLayoutHandle,
    pub(crate) ranges: Arc<[DescriptorRange]>,
    pub(crate) slots: Vec<Option<Descriptor>>,
}

impl DescriptorSetEntry {
    /// Index of the first slot written by `update`, after checking it fits
    /// its range and matches the range's descriptor type.
    fn locate(&self, update: &DescriptorUpdate<'_>) -> Result<usize, String> {
        let mut base = 0usize;
        for range in self.ranges.iter() {
            if range.binding != update.binding {
                base += range.count as usize;
                continue;
            }
            let end = u64::from(update.array_offset) + update.descriptors.len() as u64;
            if end > u64::from(range.count) {
                return Err(format!(
                    "slots {}..{end} exceed binding {} of {} descriptors",
                    update.array_offset, range.binding, range.count
                ));
            }
            if let Some(bad) = update
                .descriptors
                .iter()
                .find(|d| d.descriptor_type() != range.descriptor_type)
            {
                return Err(format!(
                    "{:?} written into a {:?} binding",
                    bad.descriptor_type(),
                    range.descriptor_type
                ));
            }
            return Ok(base + update.array_offset as usize);
        }
        Err(format!("binding {} is not in the layout", update.binding))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct QuerySlot {
    pub(crate) available: bool,
    pub(crate) values: [u64; STATISTICS_COUNTERS],
}

impl QuerySlot {
    /// Writes this slot's result into `out`, zero-padding the rest of it.
    pub(crate) fn write_result(&self, query_type: QueryType, out: &mut [u8]) {
        let words = match query_type {
            QueryType::PipelineStatistics => &self.values[..],
            _ => &self.values[..1],
        };
        let result_size = query_type.result_size() as usize;
        for (chunk, word) in out[..result_size].chunks_exact_mut(8).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out[result_size..].fill(0);
    }
}

#[derive(Debug)]
pub(crate) struct QueryPoolEntry {
    pub(crate) query_type: QueryType,
    pub(crate) slots: Vec<QuerySlot>,
}

/// Shared state behind every clone of a [`SoftDevice`].
///
/// Object maps are never locked while another one is held, except
/// `resources` followed by `mapped`.
pub(crate) struct SoftDeviceInternal {
    pub(crate) config: SoftDeviceConfig,
    pub(crate) capabilities: BTreeSet<DeviceCaps>,
    pub(crate) samplers: Mutex<HashMap<SamplerHandle, SamplerDesc>>,
    pub(crate) resources: Mutex<HashMap<ResourceHandle, ResourceEntry>>,
    pub(crate) views: Mutex<HashMap<ResourceViewHandle, ViewEntry>>,
    pub(crate) pipelines: Mutex<HashMap<PipelineHandle, PipelineEntry>>,
    pub(crate) pipeline_layouts: Mutex<HashMap<PipelineLayoutHandle, PipelineLayoutEntry>>,
    pub(crate) set_layouts: Mutex<HashMap<DescriptorSetLayoutHandle, SetLayoutEntry>>,
    pub(crate) descriptor_sets: Mutex<HashMap<DescriptorSetHandle, DescriptorSetEntry>>,
    pub(crate) query_pools: Mutex<HashMap<QueryPoolHandle, QueryPoolEntry>>,
    mapped: Mutex<HashSet<(ResourceHandle, u32)>>,
    pending: Mutex<VecDeque<Vec<Command>>>,
    execution: Mutex<()>,
    pub(crate) executed: Mutex<Vec<ExecutedOp>>,
    pub(crate) hazards: AtomicU64,
    next_handle: AtomicU64,
    allocated_bytes: AtomicU64,
    peak_bytes: AtomicU64,
    pub(crate) epoch: Instant,
    user_data: UserDataSlots,
}

/// A device whose resources live in host memory.
///
/// Cloning is cheap and every clone refers to the same device. Work submitted
/// through a [`SoftCommandQueue`](super::SoftCommandQueue) is executed by
/// [`Device::wait_idle`].
#[derive(Clone)]
pub struct SoftDevice {
    pub(crate) internal: Arc<SoftDeviceInternal>,
}

impl fmt::Debug for SoftDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftDevice")
            .field("api", &self.internal.config.api)
            .field("resources", &lock(&self.internal.resources).len())
            .field("allocated_bytes", &self.allocated_bytes())
            .finish_non_exhaustive()
    }
}

impl SoftDevice {
    /// Creates a device from `config`.
    pub fn new(config: SoftDeviceConfig) -> Self {
        let capabilities = config.resolved_capabilities();
        log::info!(
            "SoftDevice: Created {:?} device with {} capabilities, {} bytes of memory",
            config.api,
            capabilities.len(),
            config.max_memory_bytes
        );
        Self {
            internal: Arc::new(SoftDeviceInternal {
                config,
                capabilities,
                samplers: Mutex::default(),
                resources: Mutex::default(),
                views: Mutex::default(),
                pipelines: Mutex::default(),
                pipeline_layouts: Mutex::default(),
                set_layouts: Mutex::default(),
                descriptor_sets: Mutex::default(),
                query_pools: Mutex::default(),
                mapped: Mutex::default(),
                pending: Mutex::default(),
                execution: Mutex::new(()),
                executed: Mutex::default(),
                hazards: AtomicU64::new(0),
                next_handle: AtomicU64::new(1),
                allocated_bytes: AtomicU64::new(0),
                peak_bytes: AtomicU64::new(0),
                epoch: Instant::now(),
                user_data: UserDataSlots::new(),
            }),
        }
    }

    /// The configuration the device was created with.
    pub fn config(&self) -> &SoftDeviceConfig {
        &self.internal.config
    }

    pub(crate) fn next_handle(&self) -> u64 {
        self.internal.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    /// Queues a closed command stream for execution at the next `wait_idle`.
    pub(crate) fn submit(&self, commands: Vec<Command>) {
        if commands.is_empty() {
            return;
        }
        log::trace!("SoftDevice: Queued submission of {} commands", commands.len());
        lock(&self.internal.pending).push_back(commands);
    }

    /// Number of submissions waiting for execution.
    pub fn pending_submissions(&self) -> usize {
        lock(&self.internal.pending).len()
    }

    /// Every operation executed so far, in order.
    pub fn executed_ops(&self) -> Vec<ExecutedOp> {
        lock(&self.internal.executed).clone()
    }

    /// Drains the execution log.
    pub fn take_executed_ops(&self) -> Vec<ExecutedOp> {
        std::mem::take(&mut *lock(&self.internal.executed))
    }

    /// Copies whose source or destination was not in a copy state, as
    /// declared by the last barrier on it.
    pub fn hazard_count(&self) -> u64 {
        self.internal.hazards.load(Ordering::Relaxed)
    }

    /// Snapshot of a descriptor set's slots, in layout order.
    pub fn descriptor_set_contents(&self, set: DescriptorSetHandle) -> Option<Vec<Option<Descriptor>>> {
        lock(&self.internal.descriptor_sets)
            .get(&set)
            .map(|entry| entry.slots.clone())
    }

    /// State declared by the last executed barrier on `resource`.
    pub fn resource_state(&self, resource: ResourceHandle) -> Option<ResourceUsage> {
        lock(&self.internal.resources).get(&resource).map(|e| e.state)
    }

    /// Copy of a subresource's memory.
    pub fn read_subresource(&self, resource: ResourceHandle, subresource: u32) -> Option<Vec<u8>> {
        let resources = lock(&self.internal.resources);
        let entry = resources.get(&resource)?;
        let range = entry.subresource_range(subresource)?;
        Some(entry.memory[range].to_vec())
    }

    /// Name given through [`Device::set_debug_name`].
    pub fn debug_name(&self, resource: ResourceHandle) -> Option<String> {
        lock(&self.internal.resources)
            .get(&resource)
            .and_then(|e| e.debug_name.clone())
    }

    /// Bytes currently backing live resources.
    pub fn allocated_bytes(&self) -> u64 {
        self.internal.allocated_bytes.load(Ordering::Relaxed)
    }

    /// Highest value [`allocated_bytes`](Self::allocated_bytes) has reached.
    pub fn peak_bytes(&self) -> u64 {
        self.internal.peak_bytes.load(Ordering::Relaxed)
    }

    /// Number of live resources.
    pub fn resource_count(&self) -> usize {
        lock(&self.internal.resources).len()
    }

    /// Number of live resource views.
    pub fn view_count(&self) -> usize {
        lock(&self.internal.views).len()
    }

    pub(crate) fn has(&self, capability: DeviceCaps) -> bool {
        self.internal.capabilities.contains(&capability)
    }

    fn require(&self, capability: DeviceCaps) -> Result<(), ResourceError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(ResourceError::MissingCapability(capability))
        }
    }

    /// Usages a texture (or, for [`Format::Unknown`], a buffer) of `format` may have.
    fn allowed_usage(&self, format: Format) -> ResourceUsage {
        let uav = if self.internal.config.api == DeviceApi::D3D9 {
            ResourceUsage::EMPTY
        } else {
            ResourceUsage::UNORDERED_ACCESS
        };
        let base = transfer_usages() | ResourceUsage::SHADER_RESOURCE;
        match format {
            Format::Unknown => buffer_usages() - ResourceUsage::UNORDERED_ACCESS | uav,
            Format::R24G8Typeless => base | ResourceUsage::DEPTH_STENCIL,
            Format::R32Typeless => {
                base | ResourceUsage::DEPTH_STENCIL | ResourceUsage::RENDER_TARGET | uav
            }
            f if f.is_depth_stencil() => base | ResourceUsage::DEPTH_STENCIL,
            f if f.is_integer() => base | ResourceUsage::RENDER_TARGET | uav,
            f if f.is_srgb()
                || matches!(f, Format::B8G8R8A8Unorm | Format::R8G8B8A8Typeless) =>
            {
                base | ResourceUsage::RENDER_TARGET | ResourceUsage::PRESENT
            }
            _ => base | ResourceUsage::RENDER_TARGET | ResourceUsage::PRESENT | uav,
        }
    }

    fn validate_resource_desc(&self, desc: &ResourceDesc) -> Result<(), ResourceError> {
        let invalid = |reason: String| Err(ResourceError::InvalidDescription(reason));
        if desc.width == 0 {
            return invalid("resource width is zero".into());
        }
        if desc.usage.contains(ResourceUsage::CPU_ACCESS) && !desc.heap.is_cpu_visible() {
            return invalid(format!("CPU access requested on a {:?} heap", desc.heap));
        }

        if desc.is_buffer() {
            let extra = desc.usage - buffer_usages();
            if !extra.is_empty() {
                return invalid(format!("buffers cannot be used as {extra:?}"));
            }
            if !self.check_format_support(Format::Unknown, desc.usage) {
                return Err(ResourceError::UnsupportedFormat {
                    format: Format::Unknown,
                    usage: desc.usage,
                });
            }
            return Ok(());
        }

        if desc.height == 0 || desc.depth_or_layers == 0 {
            return invalid("texture height and depth must be non-zero".into());
        }
        if desc.format == Format::Unknown {
            return invalid("textures need a format".into());
        }
        let max = self.internal.config.max_texture_dimension;
        let largest = desc.width.max(u64::from(desc.height));
        if largest > u64::from(max) {
            return invalid(format!("dimension {largest} exceeds the {max} texel limit"));
        }
        let buffer_only = ResourceUsage::INDEX_BUFFER
            | ResourceUsage::VERTEX_BUFFER
            | ResourceUsage::CONSTANT_BUFFER
            | ResourceUsage::INDIRECT_ARGUMENT;
        if desc.usage.intersects(buffer_only) {
            return invalid(format!(
                "textures cannot be used as {:?}",
                desc.usage & buffer_only
            ));
        }

        let largest_extent = desc.level_extent(0);
        let longest = largest_extent.0.max(largest_extent.1).max(largest_extent.2);
        let max_levels = 32 - longest.leading_zeros();
        if u32::from(desc.levels) > max_levels {
            return invalid(format!(
                "{} mip levels requested, at most {max_levels} possible",
                desc.levels
            ));
        }
        if desc.samples == 0 {
            return invalid("sample count is zero".into());
        }
        if desc.samples > 1 && (desc.resource_type != ResourceType::Texture2D || desc.levels > 1) {
            return invalid("only single-level 2D textures can be multisampled".into());
        }
        if !self.check_format_support(desc.format, desc.usage) {
            return Err(ResourceError::UnsupportedFormat {
                format: desc.format,
                usage: desc.usage,
            });
        }
        Ok(())
    }

    fn reserve_memory(&self, bytes: u64) -> Result<(), ResourceError> {
        let previous = self
            .internal
            .allocated_bytes
            .fetch_add(bytes, Ordering::Relaxed);
        let total = previous.saturating_add(bytes);
        if total > self.internal.config.max_memory_bytes {
            self.release_memory(bytes);
            return Err(ResourceError::OutOfMemory { requested: bytes });
        }
        self.internal.peak_bytes.fetch_max(total, Ordering::Relaxed);
        Ok(())
    }

    fn release_memory(&self, bytes: u64) {
        self.internal
            .allocated_bytes
            .fetch_sub(bytes, Ordering::Relaxed);
    }

    fn fill_initial_data(
        entry: &mut ResourceEntry,
        initial_data: &[SubresourceData<'_>],
    ) -> Result<(), ResourceError> {
        let count = entry.desc.subresource_count() as usize;
        if initial_data.len() > count {
            return Err(ResourceError::InvalidDescription(format!(
                "{} initial subresources given for {count}",
                initial_data.len()
            )));
        }
        for (sub, data) in initial_data.iter().enumerate() {
            let sub = sub as u32;
            if entry.desc.is_buffer() {
                let target = &mut entry.memory[..];
                if data.data.len() > target.len() {
                    return Err(ResourceError::InvalidDescription(format!(
                        "{} bytes of initial data for a {} byte buffer",
                        data.data.len(),
                        target.len()
                    )));
                }
                target[..data.data.len()].copy_from_slice(data.data);
                continue;
            }
            let (w, h, d) = entry.extent(sub);
            if !entry.write_region(
                sub,
                &SubresourceBox::covering(w, h, d),
                data.data,
                data.row_pitch as usize,
                data.slice_pitch as usize,
            ) {
                return Err(ResourceError::InvalidDescription(format!(
                    "initial data for subresource {sub} is too small"
                )));
            }
        }
        Ok(())
    }

    fn resolve_view(
        &self,
        resource: ResourceHandle,
        desc: &ResourceDesc,
        usage_type: ResourceUsage,
        view: &ResourceViewDesc,
    ) -> Result<ViewEntry, ResourceError> {
        let invalid = |reason: String| Err(ResourceError::InvalidDescription(reason));
        let format = if view.format == Format::Unknown {
            desc.format
        } else {
            view.format
        };

        if desc.is_buffer() {
            if !matches!(view.view_type, ResourceViewType::Buffer | ResourceViewType::Unknown) {
                return invalid(format!("{:?} view of a buffer", view.view_type));
            }
            let offset = view.buffer_offset;
            let size = if view.buffer_size == u64::MAX {
                desc.width.saturating_sub(offset)
            } else {
                view.buffer_size
            };
            if size == 0 || !matches!(offset.checked_add(size), Some(end) if end <= desc.width) {
                return invalid(format!(
                    "buffer view {offset}+{size} exceeds {} bytes",
                    desc.width
                ));
            }
            return Ok(ViewEntry {
                resource,
                usage_type,
                format,
                first_level: 0,
                levels: 1,
                first_layer: 0,
                layers: 1,
                buffer_offset: offset,
                buffer_size: size,
            });
        }

        if format.bytes_per_texel() != desc.format.bytes_per_texel() {
            return Err(ResourceError::UnsupportedFormat {
                format,
                usage: usage_type,
            });
        }
        let depth_view = ResourceUsage::DEPTH_STENCIL.contains(usage_type);
        if depth_view != format.is_depth_stencil() && usage_type != ResourceUsage::SHADER_RESOURCE
        {
            return Err(ResourceError::UnsupportedFormat {
                format,
                usage: usage_type,
            });
        }

        let single_level = usage_type != ResourceUsage::SHADER_RESOURCE;
        let mip_levels = desc.mip_levels();
        let levels = match view.levels {
            u32::MAX if single_level => 1,
            u32::MAX => mip_levels.saturating_sub(view.first_level),
            n => n,
        };
        if levels == 0
            || view.first_level >= mip_levels
            || view.first_level + levels > mip_levels
            || (single_level && levels != 1)
        {
            return invalid(format!(
                "levels {}+{levels} do not fit {mip_levels} mip levels",
                view.first_level
            ));
        }
        let array_layers = desc.array_layers();
        let layers = if view.layers == u32::MAX {
            array_layers.saturating_sub(view.first_layer)
        } else {
            view.layers
        };
        if layers == 0 || view.first_layer >= array_layers || view.first_layer + layers > array_layers
        {
            return invalid(format!(
                "layers {}+{layers} do not fit {array_layers} array layers",
                view.first_layer
            ));
        }
        Ok(ViewEntry {
            resource,
            usage_type,
            format,
            first_level: view.first_level,
            levels,
            first_layer: view.first_layer,
            layers,
            buffer_offset: 0,
            buffer_size: 0,
        })
    }
}

impl ApiObject for SoftDevice {
    fn native_object(&self) -> u64 {
        Arc::as_ptr(&self.internal) as usize as u64
    }

    fn user_data(&self) -> &UserDataSlots {
        &self.internal.user_data
    }
}

impl Device for SoftDevice {
    fn api(&self) -> DeviceApi {
        self.internal.config.api
    }

    fn check_capability(&self, capability: DeviceCaps) -> bool {
        self.has(capability)
    }

    fn check_format_support(&self, format: Format, usage: ResourceUsage) -> bool {
        self.allowed_usage(format).contains(usage)
    }

    // --- Sampler Operations ---

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<SamplerHandle, ResourceError> {
        if desc.filter.is_anisotropic() {
            self.require(DeviceCaps::SamplerAnisotropic)?;
            if !(1.0..=16.0).contains(&desc.max_anisotropy) {
                return Err(ResourceError::InvalidDescription(format!(
                    "anisotropy {} outside 1..=16",
                    desc.max_anisotropy
                )));
            }
        }
        if desc.filter.is_compare() {
            self.require(DeviceCaps::SamplerCompare)?;
        }
        if desc.min_lod > desc.max_lod {
            return Err(ResourceError::InvalidDescription(format!(
                "min LOD {} above max LOD {}",
                desc.min_lod, desc.max_lod
            )));
        }
        let handle = SamplerHandle(self.next_handle());
        lock(&self.internal.samplers).insert(handle, *desc);
        log::debug!("SoftDevice: Created sampler with ID: {handle:?}");
        Ok(handle)
    }

    fn destroy_sampler(&self, sampler: SamplerHandle) {
        if lock(&self.internal.samplers).remove(&sampler).is_some() {
            log::debug!("SoftDevice: Destroyed sampler with ID: {sampler:?}");
        } else if sampler.is_some() {
            log::warn!("SoftDevice: Ignoring destroy of unknown sampler {sampler:?}");
        }
    }

    // --- Resource Operations ---

    fn create_resource(
        &self,
        desc: &ResourceDesc,
        initial_data: Option<&[SubresourceData<'_>]>,
        initial_state: ResourceUsage,
    ) -> Result<ResourceHandle, ResourceError> {
        self.validate_resource_desc(desc)?;

        let size = ResourceEntry::allocation_size(desc);
        self.reserve_memory(size)?;
        let mut entry = match ResourceEntry::allocate(*desc, initial_state) {
            Ok(entry) => entry,
            Err(e) => {
                self.release_memory(size);
                return Err(e);
            }
        };
        if let Some(data) = initial_data {
            if let Err(e) = Self::fill_initial_data(&mut entry, data) {
                self.release_memory(size);
                return Err(e);
            }
        }

        let handle = ResourceHandle(self.next_handle());
        lock(&self.internal.resources).insert(handle, entry);
        log::info!(
            "SoftDevice: Created {:?} resource with ID: {handle:?}, size: {size} bytes",
            desc.resource_type
        );
        Ok(handle)
    }

    fn destroy_resource(&self, resource: ResourceHandle) {
        let Some(entry) = lock(&self.internal.resources).remove(&resource) else {
            if resource.is_some() {
                log::warn!("SoftDevice: Ignoring destroy of unknown resource {resource:?}");
            }
            return;
        };
        let mut mapped = lock(&self.internal.mapped);
        let before = mapped.len();
        mapped.retain(|(r, _)| *r != resource);
        if mapped.len() != before {
            log::warn!("SoftDevice: Resource {resource:?} destroyed while mapped");
        }
        self.release_memory(entry.memory.len() as u64);
        log::debug!("SoftDevice: Destroyed resource with ID: {resource:?}");
    }

    fn create_resource_view(
        &self,
        resource: ResourceHandle,
        usage_type: ResourceUsage,
        desc: &ResourceViewDesc,
    ) -> Result<ResourceViewHandle, ResourceError> {
        let resource_desc = self.get_resource_desc(resource).ok_or(ResourceError::InvalidHandle {
            kind: "resource",
            raw: resource.raw(),
        })?;
        if !VIEW_KINDS.contains(&usage_type) {
            return Err(ResourceError::InvalidDescription(format!(
                "{usage_type:?} is not a single view kind"
            )));
        }
        if !resource_desc.usage.intersects(usage_type) {
            return Err(ResourceError::InvalidDescription(format!(
                "resource {resource:?} was not created for {usage_type:?}"
            )));
        }
        let entry = self.resolve_view(resource, &resource_desc, usage_type, desc)?;

        let handle = ResourceViewHandle(self.next_handle());
        lock(&self.internal.views).insert(handle, entry);
        log::debug!(
            "SoftDevice: Created {usage_type:?} view with ID: {handle:?} of resource {resource:?}"
        );
        Ok(handle)
    }

    fn destroy_resource_view(&self, view: ResourceViewHandle) {
        if lock(&self.internal.views).remove(&view).is_some() {
            log::debug!("SoftDevice: Destroyed resource view with ID: {view:?}");
        } else if view.is_some() {
            log::warn!("SoftDevice: Ignoring destroy of unknown view {view:?}");
        }
    }

    // --- Pipeline Operations ---

    fn create_pipeline(&self, desc: &PipelineDesc<'_>) -> Result<PipelineHandle, ResourceError> {
        match desc {
            PipelineDesc::Graphics(g) => {
                if g.vertex_shader.is_empty() {
                    return Err(ResourceError::InvalidDescription(
                        "graphics pipelines need a vertex shader".into(),
                    ));
                }
                if !g.geometry_shader.is_empty() {
                    self.require(DeviceCaps::GeometryShader)?;
                }
                if !g.hull_shader.is_empty() || !g.domain_shader.is_empty() {
                    self.require(DeviceCaps::HullAndDomainShader)?;
                }
                if g.rasterizer_state.fill_mode != Default::default() {
                    self.require(DeviceCaps::FillModeNonSolid)?;
                }
                let blends = &g.blend_state.render_targets;
                if blends.iter().any(|b| {
                    b.enable
                        && [b.source_color, b.dest_color, b.source_alpha, b.dest_alpha]
                            .iter()
                            .any(|f| f.is_dual_source())
                }) {
                    self.require(DeviceCaps::DualSourceBlend)?;
                }
                if blends.windows(2).any(|pair| pair[0] != pair[1]) {
                    self.require(DeviceCaps::IndependentBlend)?;
                }
                if g.render_target_formats.len() > 8 {
                    return Err(ResourceError::InvalidDescription(format!(
                        "{} render targets, at most 8",
                        g.render_target_formats.len()
                    )));
                }
                for format in &g.render_target_formats {
                    if !self.check_format_support(*format, ResourceUsage::RENDER_TARGET) {
                        return Err(ResourceError::UnsupportedFormat {
                            format: *format,
                            usage: ResourceUsage::RENDER_TARGET,
                        });
                    }
                }
                if g.depth_stencil_format != Format::Unknown
                    && !g.depth_stencil_format.is_depth_stencil()
                {
                    return Err(ResourceError::UnsupportedFormat {
                        format: g.depth_stencil_format,
                        usage: ResourceUsage::DEPTH_STENCIL,
                    });
                }
            }
            PipelineDesc::Compute(c) => {
                self.require(DeviceCaps::ComputeShader)?;
                if c.shader.is_empty() {
                    return Err(ResourceError::InvalidDescription(
                        "compute pipelines need a shader".into(),
                    ));
                }
            }
        }
        let layout = desc.layout();
        if layout.is_some() && !self.is_pipeline_layout_handle_valid(layout) {
            return Err(ResourceError::InvalidHandle {
                kind: "pipeline layout",
                raw: layout.raw(),
            });
        }

        let handle = PipelineHandle(self.next_handle());
        lock(&self.internal.pipelines).insert(
            handle,
            PipelineEntry {
                pipeline_type: desc.pipeline_type(),
                layout,
            },
        );
        log::info!(
            "SoftDevice: Created {:?} pipeline with ID: {handle:?}",
            desc.pipeline_type()
        );
        Ok(handle)
    }

    fn destroy_pipeline(&self, pipeline_type: PipelineType, pipeline: PipelineHandle) {
        match lock(&self.internal.pipelines).remove(&pipeline) {
            Some(entry) => {
                if entry.pipeline_type != pipeline_type {
                    log::warn!(
                        "SoftDevice: Pipeline {pipeline:?} is {:?}, destroyed as {pipeline_type:?}",
                        entry.pipeline_type
                    );
                }
                log::debug!("SoftDevice: Destroyed pipeline with ID: {pipeline:?}");
            }
            None if pipeline.is_some() => {
                log::warn!("SoftDevice: Ignoring destroy of unknown pipeline {pipeline:?}");
            }
            None => {}
        }
    }

    fn create_pipeline_layout(
        &self,
        set_layouts: &[DescriptorSetLayoutHandle],
        constant_ranges: &[ConstantRange],
    ) -> Result<PipelineLayoutHandle, ResourceError> {
        if let Some(missing) = set_layouts
            .iter()
            .find(|l| !self.is_descriptor_set_layout_handle_valid(**l))
        {
            return Err(ResourceError::InvalidHandle {
                kind: "descriptor set layout",
                raw: missing.raw(),
            });
        }
        if constant_ranges.iter().any(|r| r.count == 0) {
            return Err(ResourceError::InvalidDescription(
                "constant range with zero values".into(),
            ));
        }
        let handle = PipelineLayoutHandle(self.next_handle());
        lock(&self.internal.pipeline_layouts).insert(
            handle,
            PipelineLayoutEntry {
                set_layouts: set_layouts.to_vec(),
                constant_ranges: constant_ranges.to_vec(),
            },
        );
        log::debug!(
            "SoftDevice: Created pipeline layout with ID: {handle:?} ({} sets, {} constant ranges)",
            set_layouts.len(),
            constant_ranges.len()
        );
        Ok(handle)
    }

    fn destroy_pipeline_layout(&self, layout: PipelineLayoutHandle) {
        if lock(&self.internal.pipeline_layouts).remove(&layout).is_some() {
            log::debug!("SoftDevice: Destroyed pipeline layout with ID: {layout:?}");
        } else if layout.is_some() {
            log::warn!("SoftDevice: Ignoring destroy of unknown pipeline layout {layout:?}");
        }
    }

    fn create_descriptor_set_layout(
        &self,
        ranges: &[DescriptorRange],
        push_descriptors: bool,
    ) -> Result<DescriptorSetLayoutHandle, ResourceError> {
        let mut bindings = HashSet::with_capacity(ranges.len());
        for range in ranges {
            if range.count == 0 {
                return Err(ResourceError::InvalidDescription(format!(
                    "binding {} has no descriptors",
                    range.binding
                )));
            }
            if !bindings.insert(range.binding) {
                return Err(ResourceError::InvalidDescription(format!(
                    "binding {} declared twice",
                    range.binding
                )));
            }
            if range.descriptor_type == DescriptorType::SamplerWithResourceView {
                self.require(DeviceCaps::SamplerWithResourceView)?;
            }
        }
        let handle = DescriptorSetLayoutHandle(self.next_handle());
        lock(&self.internal.set_layouts).insert(
            handle,
            SetLayoutEntry {
                ranges: ranges.into(),
                push_descriptors,
            },
        );
        log::debug!("SoftDevice: Created descriptor set layout with ID: {handle:?}");
        Ok(handle)
    }

    fn destroy_descriptor_set_layout(&self, layout: DescriptorSetLayoutHandle) {
        if lock(&self.internal.set_layouts).remove(&layout).is_some() {
            log::debug!("SoftDevice: Destroyed descriptor set layout with ID: {layout:?}");
        } else if layout.is_some() {
            log::warn!("SoftDevice: Ignoring destroy of unknown descriptor set layout {layout:?}");
        }
    }

    // --- Query Operations ---

    fn create_query_pool(
        &self,
        query_type: QueryType,
        count: u32,
    ) -> Result<QueryPoolHandle, ResourceError> {
        if count == 0 {
            return Err(ResourceError::InvalidDescription(
                "query pool with zero queries".into(),
            ));
        }
        let handle = QueryPoolHandle(self.next_handle());
        lock(&self.internal.query_pools).insert(
            handle,
            QueryPoolEntry {
                query_type,
                slots: vec![QuerySlot::default(); count as usize],
            },
        );
        log::debug!("SoftDevice: Created {query_type:?} query pool with ID: {handle:?}, {count} slots");
        Ok(handle)
    }

    fn destroy_query_pool(&self, pool: QueryPoolHandle) {
        if lock(&self.internal.query_pools).remove(&pool).is_some() {
            log::debug!("SoftDevice: Destroyed query pool with ID: {pool:?}");
        } else if pool.is_some() {
            log::warn!("SoftDevice: Ignoring destroy of unknown query pool {pool:?}");
        }
    }

    // --- Descriptor Set Operations ---

    fn create_descriptor_sets(
        &self,
        layout: DescriptorSetLayoutHandle,
        count: u32,
    ) -> Result<Vec<DescriptorSetHandle>, ResourceError> {
        let ranges = {
            let layouts = lock(&self.internal.set_layouts);
            let entry = layouts.get(&layout).ok_or(ResourceError::InvalidHandle {
                kind: "descriptor set layout",
                raw: layout.raw(),
            })?;
            if entry.push_descriptors {
                return Err(ResourceError::InvalidDescription(
                    "push descriptor layouts cannot back descriptor sets".into(),
                ));
            }
            Arc::clone(&entry.ranges)
        };
        let slot_count: usize = ranges.iter().map(|r| r.count as usize).sum();

        let mut sets = lock(&self.internal.descriptor_sets);
        let handles: Vec<_> = (0..count)
            .map(|_| {
                let handle = DescriptorSetHandle(self.next_handle());
                sets.insert(
                    handle,
                    DescriptorSetEntry {
                        layout,
                        ranges: Arc::clone(&ranges),
                        slots: vec![None; slot_count],
                    },
                );
                handle
            })
            .collect();
        log::debug!("SoftDevice: Allocated {count} descriptor sets from layout {layout:?}");
        Ok(handles)
    }

    fn destroy_descriptor_sets(
        &self,
        layout: DescriptorSetLayoutHandle,
        sets: &[DescriptorSetHandle],
    ) {
        let mut live = lock(&self.internal.descriptor_sets);
        for set in sets {
            match live.get(set) {
                Some(entry) if entry.layout != layout => log::warn!(
                    "SoftDevice: Descriptor set {set:?} belongs to {:?}, not {layout:?}",
                    entry.layout
                ),
                None if set.is_some() => {
                    log::warn!("SoftDevice: Ignoring destroy of unknown descriptor set {set:?}")
                }
                _ => {}
            }
            live.remove(set);
        }
    }

    // --- Handle Validation ---

    fn is_sampler_handle_valid(&self, handle: SamplerHandle) -> bool {
        lock(&self.internal.samplers).contains_key(&handle)
    }

    fn is_resource_handle_valid(&self, handle: ResourceHandle) -> bool {
        lock(&self.internal.resources).contains_key(&handle)
    }

    fn is_resource_view_handle_valid(&self, handle: ResourceViewHandle) -> bool {
        lock(&self.internal.views).contains_key(&handle)
    }

    fn is_pipeline_handle_valid(&self, handle: PipelineHandle) -> bool {
        lock(&self.internal.pipelines).contains_key(&handle)
    }

    fn is_pipeline_layout_handle_valid(&self, handle: PipelineLayoutHandle) -> bool {
        lock(&self.internal.pipeline_layouts).contains_key(&handle)
    }

    fn is_descriptor_set_layout_handle_valid(&self, handle: DescriptorSetLayoutHandle) -> bool {
        lock(&self.internal.set_layouts).contains_key(&handle)
    }

    fn is_descriptor_set_handle_valid(&self, handle: DescriptorSetHandle) -> bool {
        lock(&self.internal.descriptor_sets).contains_key(&handle)
    }

    fn is_query_pool_handle_valid(&self, handle: QueryPoolHandle) -> bool {
        lock(&self.internal.query_pools).contains_key(&handle)
    }

    fn get_resource_from_view(&self, view: ResourceViewHandle) -> ResourceHandle {
        lock(&self.internal.views)
            .get(&view)
            .map_or(ResourceHandle::NONE, |v| v.resource)
    }

    fn get_resource_desc(&self, resource: ResourceHandle) -> Option<ResourceDesc> {
        lock(&self.internal.resources).get(&resource).map(|e| e.desc)
    }

    // --- Memory Access ---

    fn map_resource(
        &self,
        resource: ResourceHandle,
        subresource: u32,
        access: MapAccess,
    ) -> Result<MappedSubresource, MapError> {
        let mut resources = lock(&self.internal.resources);
        let entry = resources
            .get_mut(&resource)
            .ok_or(MapError::InvalidHandle(resource))?;
        if !entry.desc.heap.is_cpu_visible() {
            return Err(MapError::NotMappable(resource));
        }
        let range = entry
            .subresource_range(subresource)
            .ok_or(MapError::InvalidSubresource {
                resource,
                subresource,
            })?;
        if !lock(&self.internal.mapped).insert((resource, subresource)) {
            return Err(MapError::AlreadyMapped {
                resource,
                subresource,
            });
        }

        let (row_pitch, slice_pitch) = if entry.desc.is_buffer() {
            let size = u32::try_from(range.len()).unwrap_or(u32::MAX);
            (size, size)
        } else {
            let (level, _) = entry.desc.split_subresource(subresource);
            let row_pitch = entry.desc.row_pitch(level);
            (row_pitch, row_pitch * entry.desc.level_extent(level).1)
        };
        let bytes = &mut entry.memory[range];
        if access == MapAccess::WriteDiscard {
            bytes.fill(0);
        }
        log::trace!("SoftDevice: Mapped {resource:?} subresource {subresource} as {access:?}");
        Ok(MappedSubresource {
            size: bytes.len(),
            data: NonNull::from(bytes).cast::<u8>(),
            row_pitch,
            slice_pitch,
        })
    }

    fn unmap_resource(&self, resource: ResourceHandle, subresource: u32) {
        if !lock(&self.internal.mapped).remove(&(resource, subresource)) {
            log::warn!(
                "SoftDevice: Unmap of {resource:?} subresource {subresource}, which is not mapped"
            );
        }
    }

    fn upload_buffer_region(&self, data: &[u8], destination: ResourceHandle, offset: u64) {
        let mut resources = lock(&self.internal.resources);
        let Some(entry) = resources.get_mut(&destination) else {
            log::warn!("SoftDevice: Upload to unknown buffer {destination:?} dropped");
            return;
        };
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        match start.checked_add(data.len()) {
            Some(end) if entry.desc.is_buffer() && end <= entry.memory.len() => {
                entry.memory[start..end].copy_from_slice(data);
            }
            _ => log::warn!(
                "SoftDevice: Upload of {} bytes at {offset} does not fit {destination:?}",
                data.len()
            ),
        }
    }

    fn upload_texture_region(
        &self,
        data: &SubresourceData<'_>,
        destination: ResourceHandle,
        subresource: u32,
        dst_box: Option<&SubresourceBox>,
    ) {
        let mut resources = lock(&self.internal.resources);
        let Some(entry) = resources.get_mut(&destination) else {
            log::warn!("SoftDevice: Upload to unknown texture {destination:?} dropped");
            return;
        };
        if entry.desc.is_buffer() || subresource >= entry.desc.subresource_count() {
            log::warn!("SoftDevice: Invalid texture upload target {destination:?}/{subresource}");
            return;
        }
        let extent = entry.extent(subresource);
        let written = super::memory::resolve_box(dst_box, extent).is_some_and(|region| {
            entry.write_region(
                subresource,
                &region,
                data.data,
                data.row_pitch as usize,
                data.slice_pitch as usize,
            )
        });
        if !written {
            log::warn!(
                "SoftDevice: Texture upload to {destination:?}/{subresource} rejected, data or box out of range"
            );
        }
    }

    fn update_descriptor_sets(&self, updates: &[DescriptorUpdate<'_>]) {
        let mut sets = lock(&self.internal.descriptor_sets);
        let mut writes = Vec::with_capacity(updates.len());
        for (i, update) in updates.iter().enumerate() {
            let located = match sets.get(&update.set) {
                Some(entry) => entry.locate(update),
                None => Err(format!("unknown set {:?}", update.set)),
            };
            match located {
                Ok(start) => writes.push((update.set, start, update.descriptors)),
                Err(reason) => {
                    log::error!(
                        "SoftDevice: Descriptor update {i} rejected ({reason}), batch of {} discarded",
                        updates.len()
                    );
                    return;
                }
            }
        }
        for (set, start, descriptors) in writes {
            if let Some(entry) = sets.get_mut(&set) {
                for (slot, descriptor) in entry.slots[start..].iter_mut().zip(descriptors) {
                    *slot = Some(*descriptor);
                }
            }
        }
    }

    fn get_query_results(
        &self,
        pool: QueryPoolHandle,
        first: u32,
        count: u32,
        results: &mut [u8],
        stride: u32,
    ) -> bool {
        let pools = lock(&self.internal.query_pools);
        let Some(entry) = pools.get(&pool) else {
            log::warn!("SoftDevice: Query results requested from unknown pool {pool:?}");
            return false;
        };
        let stride = stride as usize;
        let Some(needed) = (count as usize).checked_mul(stride) else {
            return false;
        };
        if stride < entry.query_type.result_size() as usize || results.len() < needed {
            return false;
        }
        let Some(slots) = entry
            .slots
            .get(first as usize..first as usize + count as usize)
        else {
            return false;
        };
        if slots.iter().any(|slot| !slot.available) {
            return false;
        }
        for (slot, out) in slots.iter().zip(results[..needed].chunks_exact_mut(stride)) {
            slot.write_result(entry.query_type, out);
        }
        true
    }

    fn set_debug_name(&self, resource: ResourceHandle, name: &str) {
        if let Some(entry) = lock(&self.internal.resources).get_mut(&resource) {
            entry.debug_name = Some(name.to_owned());
        }
    }

    fn wait_idle(&self) {
        let _running = lock(&self.internal.execution);
        loop {
            let next = lock(&self.internal.pending).pop_front();
            let Some(commands) = next else { break };
            executor::execute(self, &commands);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::api::descriptor::ShaderStage;
    use prism_core::api::resource::MemoryHeap;

    fn device() -> SoftDevice {
        SoftDevice::new(SoftDeviceConfig::default())
    }

    fn texture_desc(width: u32, height: u32) -> ResourceDesc {
        ResourceDesc::texture_2d(
            width,
            height,
            1,
            1,
            Format::R8G8B8A8Unorm,
            MemoryHeap::GpuOnly,
            ResourceUsage::RENDER_TARGET | ResourceUsage::SHADER_RESOURCE,
        )
    }

    #[test]
    fn handles_are_unique_and_non_zero() {
        let device = device();
        let a = device
            .create_resource(&texture_desc(4, 4), None, ResourceUsage::SHADER_RESOURCE)
            .unwrap();
        let b = device
            .create_sampler(&SamplerDesc::default())
            .unwrap();
        assert!(a.is_some());
        assert_ne!(a.raw(), b.raw());
    }

    #[test]
    fn failed_creation_registers_nothing() {
        let device = device();
        let result = device.create_resource(&texture_desc(0, 4), None, ResourceUsage::EMPTY);
        assert!(matches!(result, Err(ResourceError::InvalidDescription(_))));
        assert_eq!(device.resource_count(), 0);
        assert_eq!(device.allocated_bytes(), 0);
    }

    #[test]
    fn memory_accounting_follows_lifetime() {
        let device = device();
        let handle = device
            .create_resource(&texture_desc(8, 8), None, ResourceUsage::SHADER_RESOURCE)
            .unwrap();
        assert_eq!(device.allocated_bytes(), 256);
        device.destroy_resource(handle);
        assert_eq!(device.allocated_bytes(), 0);
        assert_eq!(device.peak_bytes(), 256);
        assert!(!device.is_resource_handle_valid(handle));
    }

    #[test]
    fn memory_budget_is_enforced() {
        let device = SoftDevice::new(SoftDeviceConfig {
            max_memory_bytes: 100,
            ..SoftDeviceConfig::default()
        });
        let desc = ResourceDesc::buffer(101, MemoryHeap::GpuOnly, ResourceUsage::VERTEX_BUFFER);
        assert!(matches!(
            device.create_resource(&desc, None, ResourceUsage::VERTEX_BUFFER),
            Err(ResourceError::OutOfMemory { requested: 101 })
        ));
    }

    #[test]
    fn depth_formats_reject_colour_usages() {
        let device = device();
        assert!(device.check_format_support(Format::D32Float, ResourceUsage::DEPTH_STENCIL));
        assert!(!device.check_format_support(Format::D32Float, ResourceUsage::RENDER_TARGET));
        assert!(!device.check_format_support(
            Format::R8G8B8A8UnormSrgb,
            ResourceUsage::UNORDERED_ACCESS
        ));
        assert!(device.check_format_support(Format::R32Float, ResourceUsage::UNORDERED_ACCESS));
    }

    #[test]
    fn views_require_a_matching_usage() {
        let device = device();
        let texture = device
            .create_resource(&texture_desc(4, 4), None, ResourceUsage::SHADER_RESOURCE)
            .unwrap();
        let view_desc = ResourceViewDesc::texture_2d(Format::Unknown);
        assert!(device
            .create_resource_view(texture, ResourceUsage::UNORDERED_ACCESS, &view_desc)
            .is_err());
        let srv = device
            .create_resource_view(texture, ResourceUsage::SHADER_RESOURCE, &view_desc)
            .unwrap();
        assert_eq!(device.get_resource_from_view(srv), texture);
        assert_eq!(device.get_resource_from_view(ResourceViewHandle(999)), ResourceHandle::NONE);
    }

    #[test]
    fn gpu_only_resources_cannot_be_mapped() {
        let device = device();
        let texture = device
            .create_resource(&texture_desc(4, 4), None, ResourceUsage::SHADER_RESOURCE)
            .unwrap();
        assert_eq!(
            device.map_resource(texture, 0, MapAccess::ReadOnly).unwrap_err(),
            MapError::NotMappable(texture)
        );
    }

    #[test]
    fn mapping_twice_fails_until_unmapped() {
        let device = device();
        let desc = ResourceDesc::buffer(
            16,
            MemoryHeap::CpuToGpu,
            ResourceUsage::CONSTANT_BUFFER | ResourceUsage::CPU_ACCESS,
        );
        let buffer = device
            .create_resource(&desc, None, ResourceUsage::CONSTANT_BUFFER)
            .unwrap();
        let mapped = device.map_resource(buffer, 0, MapAccess::WriteOnly).unwrap();
        assert_eq!(mapped.size, 16);
        unsafe { mapped.as_mut_slice() }.copy_from_slice(&[7; 16]);
        assert!(matches!(
            device.map_resource(buffer, 0, MapAccess::WriteOnly),
            Err(MapError::AlreadyMapped { .. })
        ));
        device.unmap_resource(buffer, 0);
        assert_eq!(device.read_subresource(buffer, 0).unwrap(), vec![7; 16]);
        assert!(device.map_resource(buffer, 0, MapAccess::ReadOnly).is_ok());
    }

    #[test]
    fn invalid_descriptor_batch_changes_nothing() {
        let device = device();
        let layout = device
            .create_descriptor_set_layout(
                &[DescriptorRange {
                    binding: 0,
                    dx_register_index: 0,
                    dx_register_space: 0,
                    count: 2,
                    visibility: ShaderStage::PIXEL,
                    descriptor_type: DescriptorType::ShaderResourceView,
                }],
                false,
            )
            .unwrap();
        let set = device.create_descriptor_sets(layout, 1).unwrap()[0];
        let good = [Descriptor::ShaderResourceView(ResourceViewHandle(5))];
        let bad = [Descriptor::Sampler(SamplerHandle(6))];
        device.update_descriptor_sets(&[
            DescriptorUpdate {
                set,
                binding: 0,
                array_offset: 0,
                descriptors: &good,
            },
            DescriptorUpdate {
                set,
                binding: 0,
                array_offset: 1,
                descriptors: &bad,
            },
        ]);
        assert_eq!(device.descriptor_set_contents(set).unwrap(), vec![None, None]);

        device.update_descriptor_sets(&[DescriptorUpdate {
            set,
            binding: 0,
            array_offset: 1,
            descriptors: &good,
        }]);
        assert_eq!(
            device.descriptor_set_contents(set).unwrap(),
            vec![None, Some(good[0])]
        );
    }

    #[test]
    fn unavailable_queries_leave_the_buffer_untouched() {
        let device = device();
        let pool = device.create_query_pool(QueryType::Timestamp, 2).unwrap();
        let mut out = [0xaa_u8; 16];
        assert!(!device.get_query_results(pool, 0, 2, &mut out, 8));
        assert_eq!(out, [0xaa; 16]);
    }

    #[test]
    fn compute_pipelines_need_the_capability() {
        let device = SoftDevice::new(SoftDeviceConfig::for_api(DeviceApi::D3D9));
        let desc = PipelineDesc::Compute(prism_core::api::pipeline::ComputePipelineDesc {
            layout: PipelineLayoutHandle::NONE,
            shader: prism_core::api::pipeline::ShaderDesc {
                code: std::borrow::Cow::Borrowed(&[1, 2, 3]),
                entry_point: None,
            },
        });
        assert_eq!(
            device.create_pipeline(&desc),
            Err(ResourceError::MissingCapability(DeviceCaps::ComputeShader))
        );
    }
}
