//! A backend that allocates nothing. Used by the graph tests and by
//! CPU-only runs (tile preprocessing, CI) where no GL context exists.

use crate::{
    PhysicalResource, PhysicalResourceBuilder, ResourceDescriptor, StreetsError, StreetsResult,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct HeadlessResource {
    descriptor: ResourceDescriptor,
    alive_count: Arc<AtomicU64>,
}

impl HeadlessResource {
    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }
}

impl PhysicalResource for HeadlessResource {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn release(&mut self) {
        self.alive_count.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Creates [`HeadlessResource`]s and tracks how many are alive, which lets
/// tests assert on aliasing behavior and leak-freedom. An allocation limit
/// can be set to simulate the backend running out of memory.
pub struct HeadlessResourceBuilder {
    alive_count: Arc<AtomicU64>,
    total_created: AtomicU64,
    allocation_limit: AtomicU64,
}

impl Default for HeadlessResourceBuilder {
    fn default() -> Self {
        HeadlessResourceBuilder {
            alive_count: Arc::new(AtomicU64::new(0)),
            total_created: AtomicU64::new(0),
            allocation_limit: AtomicU64::new(u64::MAX),
        }
    }
}

impl HeadlessResourceBuilder {
    /// Number of resources created and not yet released
    pub fn alive_count(&self) -> u64 {
        self.alive_count.load(Ordering::Relaxed)
    }

    /// Number of resources ever created
    pub fn total_created(&self) -> u64 {
        self.total_created.load(Ordering::Relaxed)
    }

    /// Fail any allocation that would bring the total created past `limit`.
    /// Raising the limit afterwards lets previously failed allocations be
    /// retried, mimicking memory being freed up between frames.
    pub fn set_allocation_limit(
        &self,
        limit: u64,
    ) {
        self.allocation_limit.store(limit, Ordering::Relaxed);
    }
}

impl PhysicalResourceBuilder for HeadlessResourceBuilder {
    fn create_from_descriptor(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> StreetsResult<Box<dyn PhysicalResource>> {
        let limit = self.allocation_limit.load(Ordering::Relaxed);
        if self.total_created.load(Ordering::Relaxed) >= limit {
            return Err(StreetsError::BackendAllocation(format!(
                "headless allocation limit of {} reached",
                limit
            )));
        }

        self.total_created.fetch_add(1, Ordering::Relaxed);
        self.alive_count.fetch_add(1, Ordering::Relaxed);

        log::trace!("headless create {:?}", descriptor);

        Ok(Box::new(HeadlessResource {
            descriptor: descriptor.clone(),
            alive_count: self.alive_count.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceUsageFlags;

    #[test]
    fn tracks_alive_count() {
        let builder = HeadlessResourceBuilder::default();
        let descriptor = ResourceDescriptor::buffer(64, ResourceUsageFlags::UNIFORM_BUFFER);

        let mut a = builder.create_from_descriptor(&descriptor).unwrap();
        let mut b = builder.create_from_descriptor(&descriptor).unwrap();
        assert_eq!(builder.alive_count(), 2);

        a.release();
        b.release();
        assert_eq!(builder.alive_count(), 0);
        assert_eq!(builder.total_created(), 2);
    }

    #[test]
    fn allocation_limit_fails_then_allows_retry() {
        let builder = HeadlessResourceBuilder::default();
        builder.set_allocation_limit(0);

        let descriptor = ResourceDescriptor::buffer(64, ResourceUsageFlags::UNIFORM_BUFFER);
        assert!(matches!(
            builder.create_from_descriptor(&descriptor),
            Err(StreetsError::BackendAllocation(_))
        ));

        builder.set_allocation_limit(1);
        let mut resource = builder.create_from_descriptor(&descriptor).unwrap();
        resource.release();
    }
}
