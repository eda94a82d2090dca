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

//! Software reference backend.
//!
//! [`SoftDevice`] keeps every object in CPU memory and replays submitted
//! command streams when the queue is waited on. It is faithful enough to
//! exercise the whole contract (handles, descriptor updates, queries,
//! indirect arguments, copies, clears) without a GPU.
//!
//! Operations behind a capability the device does not report are recorded
//! normally and executed as logged no-ops, showing up as
//! [`ExecutedOp::Skipped`] in the execution log:
//!
//! | Operation | Capability |
//! |---|---|
//! | `dispatch` | `ComputeShader` |
//! | `draw_or_dispatch_indirect` | `DrawOrDispatchIndirect` |
//! | `copy_buffer_region` | `CopyBufferRegion` |
//! | `copy_buffer_to_texture`, `copy_texture_to_buffer` | `CopyBufferToTexture` |
//! | scaled `copy_texture_region` | `Blit` |
//! | `resolve_texture_region` with a source box | `ResolveRegion` |
//! | `copy_query_results` | `CopyQueryResults` |
//!
//! Partial binds with a non-zero `first` are applied as recorded, even when
//! the matching `Partial*Updates` capability is missing.

mod command;
mod config;
mod device;
mod executor;
mod memory;
mod queue;
mod runtime;
mod uniforms;

pub use command::{Command, ListState, SoftCommandList};
pub use config::{capability_preset, SoftDeviceConfig};
pub use device::SoftDevice;
pub use executor::ExecutedOp;
pub use queue::SoftCommandQueue;
pub use runtime::{RuntimeEvent, SoftEffectRuntime, BACK_BUFFER_SEMANTIC};
pub use uniforms::UniformType;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
