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

//! The software [`CommandQueue`].

use super::command::{ListState, SoftCommandList};
use super::device::SoftDevice;
use prism_core::api::user_data::UserDataSlots;
use prism_core::traits::{ApiObject, CommandList, CommandQueue, Device};

/// A queue that hands closed command streams to its [`SoftDevice`].
///
/// Submissions are executed in order by [`CommandQueue::wait_idle`].
#[derive(Debug)]
pub struct SoftCommandQueue {
    device: SoftDevice,
    immediate: SoftCommandList,
    id: u64,
    user_data: UserDataSlots,
}

impl SoftCommandQueue {
    /// Creates a queue submitting to `device`.
    pub fn new(device: SoftDevice) -> Self {
        let id = device.next_handle();
        Self {
            immediate: SoftCommandList::new(device.clone()),
            device,
            id,
            user_data: UserDataSlots::new(),
        }
    }

    /// The concrete device this queue submits to.
    pub fn soft_device(&self) -> &SoftDevice {
        &self.device
    }

    /// Read access to the immediate list, mostly for inspection.
    pub fn immediate(&self) -> &SoftCommandList {
        &self.immediate
    }
}

impl ApiObject for SoftCommandQueue {
    fn native_object(&self) -> u64 {
        self.id
    }

    fn user_data(&self) -> &UserDataSlots {
        &self.user_data
    }
}

impl CommandQueue for SoftCommandQueue {
    fn device(&self) -> &dyn Device {
        &self.device
    }

    fn get_immediate_command_list(&mut self) -> &mut dyn CommandList {
        &mut self.immediate
    }

    fn flush_immediate_command_list(&mut self) {
        let commands = self.immediate.take_for_flush();
        self.device.submit(commands);
    }

    fn execute_command_list(&mut self, list: &mut dyn CommandList) {
        self.flush_immediate_command_list();
        let Some(list) = list.as_any_mut().downcast_mut::<SoftCommandList>() else {
            log::error!("SoftCommandQueue: Command list from another backend cannot be executed");
            return;
        };
        if list.state() == ListState::Closed {
            log::warn!("SoftCommandQueue: Command list was already submitted, reset it first");
            return;
        }
        let commands = list.close();
        self.device.submit(commands);
    }

    fn wait_idle(&mut self) {
        self.flush_immediate_command_list();
        Device::wait_idle(&self.device);
    }

    fn add_debug_marker(&mut self, label: &str, color: [f32; 4]) {
        self.immediate.add_debug_marker(label, color);
    }

    fn begin_debug_marker(&mut self, label: &str, color: [f32; 4]) {
        self.immediate.begin_debug_marker(label, color);
    }

    fn finish_debug_marker(&mut self) {
        self.immediate.finish_debug_marker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soft::SoftDeviceConfig;

    #[test]
    fn submitted_lists_run_after_the_immediate_list() {
        let device = SoftDevice::new(SoftDeviceConfig::default());
        let mut queue = SoftCommandQueue::new(device.clone());
        queue.get_immediate_command_list().draw(1, 1, 0, 0);

        let mut list = SoftCommandList::new(device.clone());
        list.draw(2, 1, 0, 0);
        queue.execute_command_list(&mut list);
        assert_eq!(device.pending_submissions(), 2);
        assert_eq!(list.state(), ListState::Closed);

        queue.wait_idle();
        let counts: Vec<u32> = device
            .executed_ops()
            .into_iter()
            .filter_map(|op| match op {
                crate::soft::ExecutedOp::Draw { vertex_count, .. } => Some(vertex_count),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![1, 2]);
        assert_eq!(device.pending_submissions(), 0);
    }

    #[test]
    fn closed_lists_are_not_resubmitted() {
        let device = SoftDevice::new(SoftDeviceConfig::default());
        let mut queue = SoftCommandQueue::new(device.clone());
        let mut list = SoftCommandList::new(device.clone());
        list.draw(3, 1, 0, 0);
        queue.execute_command_list(&mut list);
        queue.execute_command_list(&mut list);
        assert_eq!(device.pending_submissions(), 1);
    }
}
