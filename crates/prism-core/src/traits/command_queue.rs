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
use super::command_list::CommandList;
use super::device::Device;

/// Submission and execution authority over command lists.
///
/// The queue owns one immediate command list. Work recorded there is flushed
/// at the backend's discretion, at the latest right before another list is
/// submitted or on [`flush_immediate_command_list`](Self::flush_immediate_command_list).
/// Submitted work cannot be cancelled.
pub trait CommandQueue: ApiObject + Send {
    /// The device this queue submits to.
    fn device(&self) -> &dyn Device;

    /// The queue-owned immediate command list.
    fn get_immediate_command_list(&mut self) -> &mut dyn CommandList;

    /// Submits whatever the immediate list holds.
    fn flush_immediate_command_list(&mut self);

    /// Submits a recorded command list, flushing the immediate list first.
    ///
    /// The list is closed afterwards.
    fn execute_command_list(&mut self, list: &mut dyn CommandList);

    /// Blocks until every piece of work submitted to this queue has completed.
    fn wait_idle(&mut self);

    /// Inserts a debug label on the queue timeline.
    fn add_debug_marker(&mut self, label: &str, color: [f32; 4]);

    /// Opens a debug label region on the queue timeline.
    fn begin_debug_marker(&mut self, label: &str, color: [f32; 4]);

    /// Closes the innermost queue debug label region.
    fn finish_debug_marker(&mut self);
}
