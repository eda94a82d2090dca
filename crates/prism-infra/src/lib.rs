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

//! # Prism Infra
//!
//! Concrete implementations of the `prism-core` contracts.
//!
//! The [`soft`] backend executes recorded command streams against CPU memory.
//! It is the reference implementation used by the registry wiring and by the
//! contract tests.

#![warn(missing_docs)]

pub mod soft;

pub use soft::{
    Command, ExecutedOp, ListState, RuntimeEvent, SoftCommandList, SoftCommandQueue,
    SoftDevice, SoftDeviceConfig, SoftEffectRuntime, UniformType,
};
