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

//! # Prism Hooks
//!
//! The context interception registry. It observes native context creation,
//! sharing, activation, destruction and presentation, and keeps track of which
//! effect runtime belongs to which native context and which one is current on
//! each thread.

#![warn(missing_docs)]

pub mod attribs;
pub mod config;
pub mod native;
pub mod pixel_format;
pub mod proc_alias;
pub mod registry;
pub mod sharing;

pub use config::RegistryConfig;
pub use native::{DeviceContext, NativeContext, NativeGl, PbufferHandle, WindowHandle};
pub use registry::{ContextRegistry, RuntimeFactory, RuntimeRequest, SharedRuntime};
pub use sharing::SharingGroups;
