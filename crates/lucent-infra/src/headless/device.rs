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

use lucent_core::renderer::api::{BufferDescriptor, BufferId, BufferUsage};
use lucent_core::renderer::{GraphicsDevice, ResourceError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct HeadlessBufferEntry {
    label: Option<String>,
    usage: BufferUsage,
    data: Vec<u8>,
}

/// A [`GraphicsDevice`] that keeps buffers in system memory.
///
/// It exposes probes for the number of live buffers and the bytes they hold, which
/// makes resource leaks observable in tests.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    buffers: Mutex<HashMap<BufferId, HeadlessBufferEntry>>,
    next_buffer_id: AtomicUsize,
    allocated_bytes: AtomicUsize,
    lost: AtomicBool,
}

impl HeadlessDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of buffers created and not yet destroyed.
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.lock().map(|buffers| buffers.len()).unwrap_or(0)
    }

    /// The total size of the live buffers.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// A copy of a buffer's bytes.
    pub fn buffer_contents(&self, id: BufferId) -> Option<Vec<u8>> {
        let buffers = self.buffers.lock().ok()?;
        buffers.get(&id).map(|entry| entry.data.clone())
    }

    /// Reads a buffer back as a list of `T`. Trailing bytes that do not fill a `T` are ignored.
    ///
    /// Returns `None` for an unknown buffer or a zero-sized `T`.
    pub fn read_buffer<T: bytemuck::Pod>(&self, id: BufferId) -> Option<Vec<T>> {
        let size = std::mem::size_of::<T>();
        if size == 0 {
            return None;
        }
        let data = self.buffer_contents(id)?;
        Some(
            data.chunks_exact(size)
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        )
    }

    /// The usage flags a buffer was created with.
    pub fn buffer_usage(&self, id: BufferId) -> Option<BufferUsage> {
        let buffers = self.buffers.lock().ok()?;
        buffers.get(&id).map(|entry| entry.usage)
    }

    /// The debug label a buffer was created with.
    pub fn buffer_label(&self, id: BufferId) -> Option<String> {
        let buffers = self.buffers.lock().ok()?;
        buffers.get(&id).and_then(|entry| entry.label.clone())
    }

    /// Simulates a device loss. Every allocation fails until [`restore`](Self::restore).
    pub fn lose(&self) {
        log::warn!("HeadlessDevice: simulating device loss.");
        self.lost.store(true, Ordering::SeqCst);
    }

    /// Ends a simulated device loss.
    pub fn restore(&self) {
        self.lost.store(false, Ordering::SeqCst);
    }

    /// Whether a device loss is being simulated.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    fn check_alive(&self) -> Result<(), ResourceError> {
        if self.is_lost() {
            Err(ResourceError::BackendError("device lost".to_string()))
        } else {
            Ok(())
        }
    }

    fn lock_buffers(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<BufferId, HeadlessBufferEntry>>, ResourceError> {
        self.buffers
            .lock()
            .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned (buffers): {e}")))
    }

    fn insert_buffer(
        &self,
        descriptor: &BufferDescriptor,
        data: Vec<u8>,
    ) -> Result<BufferId, ResourceError> {
        let mut buffers = self.lock_buffers()?;
        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        let size = data.len();
        buffers.insert(
            id,
            HeadlessBufferEntry {
                label: descriptor.label.as_deref().map(String::from),
                usage: descriptor.usage,
                data,
            },
        );
        self.allocated_bytes.fetch_add(size, Ordering::Relaxed);
        log::debug!(
            "HeadlessDevice: Created buffer '{}' with ID: {id:?}",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(id)
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.check_alive()?;
        let size = usize::try_from(descriptor.size).map_err(|_| ResourceError::OutOfBounds)?;
        self.insert_buffer(descriptor, vec![0; size])
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        self.check_alive()?;
        self.insert_buffer(descriptor, data.to_vec())
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut buffers = self.lock_buffers()?;

        if let Some(entry) = buffers.remove(&id) {
            self.allocated_bytes
                .fetch_sub(entry.data.len(), Ordering::Relaxed);
            log::debug!("HeadlessDevice: Destroyed buffer with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        self.check_alive()?;
        let mut buffers = self.lock_buffers()?;
        let entry = buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;

        let start = usize::try_from(offset).map_err(|_| ResourceError::OutOfBounds)?;
        let end = start
            .checked_add(data.len())
            .filter(|end| *end <= entry.data.len())
            .ok_or(ResourceError::OutOfBounds)?;
        entry.data[start..end].copy_from_slice(data);
        Ok(())
    }
}
