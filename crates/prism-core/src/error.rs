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

//! Error types returned across the device and runtime contracts.

use crate::api::caps::DeviceCaps;
use crate::api::format::Format;
use crate::api::handle::ResourceHandle;
use crate::api::resource::ResourceUsage;
use std::fmt;

/// Why a device object could not be created.
///
/// An `Err` never carries a handle: a failed creation leaves nothing reachable
/// on the device.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// The description is malformed (zero extent, empty shader, bad range...).
    InvalidDescription(String),
    /// The format cannot be used with the requested usage on this device.
    UnsupportedFormat {
        /// The offending format.
        format: Format,
        /// The usage it was requested for.
        usage: ResourceUsage,
    },
    /// The object needs a capability the device does not expose.
    MissingCapability(DeviceCaps),
    /// A handle passed as a dependency is stale or was never issued.
    InvalidHandle {
        /// Which kind of object the handle was expected to name.
        kind: &'static str,
        /// The raw handle value.
        raw: u64,
    },
    /// The allocation exceeds the memory the device is willing to hand out.
    OutOfMemory {
        /// Requested size in bytes.
        requested: u64,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::InvalidDescription(msg) => write!(f, "Invalid description: {msg}"),
            ResourceError::UnsupportedFormat { format, usage } => {
                write!(f, "Format {format:?} does not support usage {usage:?}")
            }
            ResourceError::MissingCapability(cap) => {
                write!(f, "Device lacks required capability {cap:?}")
            }
            ResourceError::InvalidHandle { kind, raw } => {
                write!(f, "Invalid {kind} handle {raw:#x}")
            }
            ResourceError::OutOfMemory { requested } => {
                write!(f, "Out of device memory ({requested} bytes requested)")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// Why a subresource could not be mapped for CPU access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The resource handle is not valid on this device.
    InvalidHandle(ResourceHandle),
    /// The subresource index is out of range for the resource.
    InvalidSubresource {
        /// Resource being mapped.
        resource: ResourceHandle,
        /// Requested subresource index.
        subresource: u32,
    },
    /// The resource lives in a heap the CPU cannot see.
    NotMappable(ResourceHandle),
    /// The subresource is already mapped; it must be unmapped first.
    AlreadyMapped {
        /// Resource being mapped.
        resource: ResourceHandle,
        /// Requested subresource index.
        subresource: u32,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::InvalidHandle(resource) => write!(f, "Cannot map invalid resource {resource:?}"),
            MapError::InvalidSubresource {
                resource,
                subresource,
            } => write!(f, "Subresource {subresource} out of range for {resource:?}"),
            MapError::NotMappable(resource) => {
                write!(f, "Resource {resource:?} is not in a CPU visible heap")
            }
            MapError::AlreadyMapped {
                resource,
                subresource,
            } => write!(f, "Subresource {subresource} of {resource:?} is already mapped"),
        }
    }
}

impl std::error::Error for MapError {}

/// Failures of an effect runtime lifecycle step.
#[derive(Debug)]
pub enum RuntimeError {
    /// Size-dependent resources could not be created.
    InitializationFailed {
        /// Requested frame width.
        width: u32,
        /// Requested frame height.
        height: u32,
        /// The device error that stopped initialisation.
        source: ResourceError,
    },
    /// The native context does not reach the required API version.
    CapabilityFloor {
        /// Required major version.
        major: u32,
        /// Required minor version.
        minor: u32,
    },
    /// The runtime could not be constructed for another reason.
    Construction(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::InitializationFailed {
                width,
                height,
                source,
            } => write!(f, "Failed to initialize runtime at {width}x{height}: {source}"),
            RuntimeError::CapabilityFloor { major, minor } => {
                write!(f, "Context does not support version {major}.{minor}")
            }
            RuntimeError::Construction(msg) => write!(f, "Runtime construction failed: {msg}"),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::InitializationFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Umbrella error for callers that deal with several subsystems at once.
#[derive(Debug)]
pub enum PrismError {
    /// See [`ResourceError`].
    Resource(ResourceError),
    /// See [`MapError`].
    Map(MapError),
    /// See [`RuntimeError`].
    Runtime(RuntimeError),
}

impl fmt::Display for PrismError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrismError::Resource(e) => write!(f, "Resource error: {e}"),
            PrismError::Map(e) => write!(f, "Map error: {e}"),
            PrismError::Runtime(e) => write!(f, "Runtime error: {e}"),
        }
    }
}

impl std::error::Error for PrismError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PrismError::Resource(e) => Some(e),
            PrismError::Map(e) => Some(e),
            PrismError::Runtime(e) => Some(e),
        }
    }
}

impl From<ResourceError> for PrismError {
    fn from(e: ResourceError) -> Self {
        PrismError::Resource(e)
    }
}

impl From<MapError> for PrismError {
    fn from(e: MapError) -> Self {
        PrismError::Map(e)
    }
}

impl From<RuntimeError> for PrismError {
    fn from(e: RuntimeError) -> Self {
        PrismError::Runtime(e)
    }
}
