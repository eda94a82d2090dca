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

//! Backend-agnostic object model.
//!
//! - **[`handle`]**: opaque 64-bit identifiers for every device object.
//! - **[`caps`]** and **[`format`]**: what a device can do and which pixel formats exist.
//! - **[`resource`]**: buffers, textures, views, samplers and mapping.
//! - **[`pipeline`]** and **[`descriptor`]**: render state and resource binding shapes.
//! - **[`query`]**, **[`indirect`]** and **[`render`]**: command parameters.
//! - **[`user_data`]**: auxiliary state attached to any object.

pub mod caps;
pub mod descriptor;
pub mod format;
pub mod handle;
pub mod indirect;
pub mod pipeline;
pub mod query;
pub mod render;
pub mod resource;
pub mod user_data;

pub use self::caps::{DeviceApi, DeviceCaps};
pub use self::descriptor::{
    ConstantRange, Descriptor, DescriptorRange, DescriptorType, DescriptorUpdate, ShaderStage,
};
pub use self::format::Format;
pub use self::handle::*;
pub use self::indirect::{
    DispatchIndirectArgs, DrawIndexedIndirectArgs, DrawIndirectArgs, IndirectCommand,
};
pub use self::pipeline::{PipelineDesc, PipelineState, PipelineType};
pub use self::query::QueryType;
pub use self::render::{ClearFlags, Rect, Viewport};
pub use self::resource::{
    MapAccess, MappedSubresource, MemoryHeap, ResourceDesc, ResourceType, ResourceUsage,
    ResourceViewDesc, ResourceViewType, SamplerDesc, SubresourceBox, SubresourceData,
    TextureFilter,
};
pub use self::user_data::{UserDataKey, UserDataSlots};
