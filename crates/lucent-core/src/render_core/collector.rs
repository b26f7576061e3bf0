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

//! The owned-resource registry a render core fills while attaching.

use crate::renderer::traits::GpuResource;
use std::fmt;
use std::sync::Arc;

/// Identifies one entry of a [`ResourceCollector`], for early release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(u64);

struct CollectedResource {
    key: ResourceKey,
    label: String,
    release: Box<dyn FnOnce() + Send>,
}

/// An explicit list of resources owned by one render core.
///
/// Each entry is a release action that runs exactly once: either through
/// [`release`](ResourceCollector::release), through
/// [`release_all`](ResourceCollector::release_all), or when the collector is dropped.
/// Entries are released in reverse acquisition order.
#[derive(Default)]
pub struct ResourceCollector {
    entries: Vec<CollectedResource>,
    next_key: u64,
}

impl ResourceCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes shared ownership of a backend resource and schedules its release.
    ///
    /// ## Arguments
    /// * `resource` - The resource handle. The collector keeps its own clone.
    /// ## Returns
    /// A key that can be passed to [`release`](ResourceCollector::release).
    pub fn collect<R>(&mut self, resource: &Arc<R>) -> ResourceKey
    where
        R: GpuResource + ?Sized + 'static,
    {
        let handle = Arc::clone(resource);
        let label = handle.name().to_owned();
        self.collect_with(label, move || handle.release())
    }

    /// Registers an arbitrary release action, e.g. destroying a buffer on a device.
    pub fn collect_with<F>(&mut self, label: impl Into<String>, release: F) -> ResourceKey
    where
        F: FnOnce() + Send + 'static,
    {
        let key = ResourceKey(self.next_key);
        self.next_key += 1;
        self.entries.push(CollectedResource {
            key,
            label: label.into(),
            release: Box::new(release),
        });
        key
    }

    /// Releases a single entry before the rest.
    ///
    /// ## Returns
    /// `false` if the key is unknown or was already released.
    pub fn release(&mut self, key: ResourceKey) -> bool {
        match self.entries.iter().position(|entry| entry.key == key) {
            Some(index) => {
                let entry = self.entries.remove(index);
                log::trace!("Releasing resource '{}' early.", entry.label);
                (entry.release)();
                true
            }
            None => false,
        }
    }

    /// Releases every entry and leaves the collector empty.
    ///
    /// ## Returns
    /// How many resources were released.
    pub fn release_all(&mut self) -> usize {
        let count = self.entries.len();
        while let Some(entry) = self.entries.pop() {
            log::trace!("Releasing resource '{}'.", entry.label);
            (entry.release)();
        }
        count
    }

    /// The number of resources currently owned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is owned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The labels of the owned resources, in acquisition order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }
}

impl fmt::Debug for ResourceCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCollector")
            .field("entries", &self.labels().collect::<Vec<_>>())
            .finish()
    }
}

impl Drop for ResourceCollector {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            log::warn!(
                "ResourceCollector dropped while owning {} resource(s); releasing them now.",
                self.entries.len()
            );
            self.release_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CountingResource {
        releases: AtomicUsize,
    }

    impl GpuResource for CountingResource {
        fn name(&self) -> &str {
            "counting"
        }

        fn release(&self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }

        fn is_released(&self) -> bool {
            self.releases.load(Ordering::SeqCst) > 0
        }
    }

    #[test]
    fn release_all_releases_each_once() {
        let resource = Arc::new(CountingResource::default());
        let mut collector = ResourceCollector::new();
        collector.collect(&resource);

        assert_eq!(collector.release_all(), 1);
        assert_eq!(collector.release_all(), 0);
        assert!(collector.is_empty());
        assert_eq!(resource.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_all_runs_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut collector = ResourceCollector::new();
        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            collector.collect_with(label, move || order.lock().unwrap().push(label));
        }

        collector.release_all();

        assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[test]
    fn early_release_removes_only_that_entry() {
        let a = Arc::new(CountingResource::default());
        let b = Arc::new(CountingResource::default());
        let mut collector = ResourceCollector::new();
        let key_a = collector.collect(&a);
        collector.collect(&b);

        assert!(collector.release(key_a));
        assert!(!collector.release(key_a));
        assert_eq!(collector.len(), 1);
        assert!(a.is_released());
        assert!(!b.is_released());
    }

    #[test]
    fn drop_releases_leftovers() {
        let resource = Arc::new(CountingResource::default());
        {
            let mut collector = ResourceCollector::new();
            collector.collect(&resource);
        }
        assert_eq!(resource.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn accepts_trait_object_handles() {
        let resource: Arc<dyn GpuResource> = Arc::new(CountingResource::default());
        let mut collector = ResourceCollector::new();
        collector.collect(&resource);

        assert_eq!(collector.labels().collect::<Vec<_>>(), vec!["counting"]);
        collector.release_all();
        assert!(resource.is_released());
    }
}
