use crate::graph_builder::RenderGraphBuilder;
use crate::graph_resource::{PhysicalResourceHandle, RenderGraphResourceId};
use fnv::FnvHashMap;
use streets_api::ResourceDescriptor;

struct CachedPhysicalResource {
    keep_until_frame: u64,
    handle: PhysicalResourceHandle,
}

/// Pools physical allocations across frames. Persistent allocations are
/// keyed by the owning resource and live until that resource is removed from
/// the graph; transient allocations are keyed by descriptor and evicted once
/// they go unused for a few frames. Dropping an evicted entry releases the
/// backend object.
pub struct RenderGraphCache {
    persistent: FnvHashMap<RenderGraphResourceId, PhysicalResourceHandle>,
    transient: FnvHashMap<ResourceDescriptor, Vec<CachedPhysicalResource>>,
    current_frame_index: u64,
    frames_to_persist: u64,
}

impl RenderGraphCache {
    pub fn new(max_frames_in_flight: u32) -> Self {
        RenderGraphCache {
            persistent: Default::default(),
            transient: Default::default(),
            current_frame_index: 0,
            frames_to_persist: max_frames_in_flight as u64 + 1,
        }
    }

    pub fn on_frame_complete(&mut self) {
        let current_frame_index = self.current_frame_index;

        for pool in self.transient.values_mut() {
            pool.retain(|cached| cached.keep_until_frame > current_frame_index);
        }
        self.transient.retain(|_key, pool| !pool.is_empty());

        self.current_frame_index += 1;
    }

    /// Release everything, including persistent allocations
    pub fn clear(&mut self) {
        self.persistent.clear();
        self.transient.clear();
    }

    pub(crate) fn checkout_persistent(
        &mut self,
        resource: RenderGraphResourceId,
    ) -> Option<PhysicalResourceHandle> {
        self.persistent.remove(&resource)
    }

    pub(crate) fn checkin_persistent(
        &mut self,
        resource: RenderGraphResourceId,
        handle: PhysicalResourceHandle,
    ) {
        let old = self.persistent.insert(resource, handle);
        // If this trips, two slots claimed the same owning resource
        assert!(old.is_none());
    }

    pub(crate) fn checkout_transient(
        &mut self,
        descriptor: &ResourceDescriptor,
    ) -> Option<PhysicalResourceHandle> {
        let pool = self.transient.get_mut(descriptor)?;
        let cached = pool.pop()?;
        log::trace!("  Transient REUSE {:?}", descriptor);
        Some(cached.handle)
    }

    pub(crate) fn checkin_transient(
        &mut self,
        handle: PhysicalResourceHandle,
    ) {
        let keep_until_frame = self.current_frame_index + self.frames_to_persist;
        log::trace!(
            "  Keep transient {:?} until frame {}",
            handle.descriptor(),
            keep_until_frame
        );
        self.transient
            .entry(handle.descriptor().clone())
            .or_insert_with(Default::default)
            .push(CachedPhysicalResource {
                keep_until_frame,
                handle,
            });
    }

    /// Drop persistent allocations whose owning resource was removed from
    /// the graph. Called after recompilation, never mid-frame.
    pub(crate) fn release_removed(
        &mut self,
        graph: &RenderGraphBuilder,
    ) {
        self.persistent.retain(|&resource_id, _handle| {
            let keep = graph
                .resources
                .get(resource_id.0)
                .map_or(false, |resource| !resource.is_removed);
            if !keep {
                log::trace!(
                    "  Release persistent allocation of removed resource {:?}",
                    resource_id
                );
            }
            keep
        });
    }
}
