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

//! The contracts every backend implements.
//!
//! - [`Device`]: object factory and bookkeeping authority for one logical GPU.
//! - [`CommandList`]: an ordered, replayable stream of GPU operations.
//! - [`CommandQueue`]: submission authority owning the immediate command list.
//! - [`EffectRuntime`]: the per-swap-chain façade driven by effect and addon logic.
//! - [`ApiObject`]: what all of the above share (native handle and user data).

mod api_object;
mod command_list;
mod command_queue;
mod device;
mod effect_runtime;

pub use self::api_object::ApiObject;
pub use self::command_list::CommandList;
pub use self::command_queue::CommandQueue;
pub use self::device::Device;
pub use self::effect_runtime::{EffectRuntime, UniformValues};
