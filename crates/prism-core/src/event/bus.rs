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

/// A multi-producer channel carrying notifications of type `T`.
///
/// Producers obtain a [`flume::Sender`] through [`EventBus::sender`]; the owner
/// of the bus drains pending notifications through [`EventBus::drain`] or reads
/// them one by one from [`EventBus::receiver`].
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a bus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus<{}> created.", std::any::type_name::<T>());
        Self { sender, receiver }
    }

    /// Sends `event` to every reader of this bus.
    ///
    /// The bus owns its own receiver, so publishing only fails if the bus is
    /// being torn down concurrently; such failures are logged and dropped.
    pub fn publish(&self, event: T) {
        if self.sender.send(event).is_err() {
            log::error!("EventBus: receiver disconnected, event dropped.");
        }
    }

    /// Returns a new producer handle for this bus.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns the receiving end of the bus.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Removes and returns every event currently queued, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Number of events waiting to be read.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
