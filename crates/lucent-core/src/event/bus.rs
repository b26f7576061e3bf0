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

/// A shared channel that collects events from many producers.
///
/// A renderer typically owns one `EventBus<Invalidation>` and hands its
/// [`sender`](EventBus::sender) to every render core it schedules, so a single
/// [`drain`](EventBus::drain) per frame tells it whether a redraw is needed.
#[derive(Debug)]
pub struct EventBus<T: Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Send + 'static> EventBus<T> {
    /// Creates a bus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    /// A new producer handle. Producers may outlive the bus; their sends then fail.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Takes every event currently queued, in arrival order.
    pub fn drain(&self) -> Vec<T> {
        let events: Vec<T> = self.receiver.try_iter().collect();
        if !events.is_empty() {
            log::trace!("EventBus drained {} event(s).", events.len());
        }
        events
    }
}

impl<T: Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
