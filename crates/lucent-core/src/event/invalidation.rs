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

use crate::render_core::RenderCoreId;

/// Raised by a render core when its visual state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Invalidation {
    /// The core that raised the event.
    pub source: RenderCoreId,
    /// `true` when the whole frame must be rendered again, not just this core.
    pub requires_rerender: bool,
}

/// A multi-listener event carrying [`Invalidation`]s.
///
/// Listeners are channel senders. The event never holds the listening object
/// itself, so neither side keeps the other alive. A listener whose receiver was
/// dropped is pruned the next time the event is raised.
#[derive(Debug, Default)]
pub struct InvalidationEvent {
    listeners: Vec<flume::Sender<Invalidation>>,
}

impl InvalidationEvent {
    /// Creates an event with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dedicated channel and returns its receiving end.
    pub fn subscribe(&mut self) -> flume::Receiver<Invalidation> {
        let (sender, receiver) = flume::unbounded();
        self.listeners.push(sender);
        receiver
    }

    /// Registers an existing sender, e.g. the one of a renderer-wide
    /// [`EventBus`](super::EventBus).
    pub fn add_listener(&mut self, sender: flume::Sender<Invalidation>) {
        self.listeners.push(sender);
    }

    /// Delivers `event` to every live listener and returns how many received it.
    pub fn raise(&mut self, event: Invalidation) -> usize {
        let mut delivered = 0;
        self.listeners.retain(|listener| match listener.send(event) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                log::trace!("Pruning disconnected invalidation listener.");
                false
            }
        });
        delivered
    }

    /// Removes every listener.
    pub fn reset(&mut self) {
        self.listeners.clear();
    }

    /// The number of registered listeners, including ones not yet pruned.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
