use crate::RenderGraphResourceName;
use streets_api::{
    PhysicalResource, ResourceDescriptor, ResourceUsageFlags, StreetsError, StreetsResult,
};

/// Unique ID for a resource declared in the graph
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RenderGraphResourceId(pub(crate) usize);

/// An ID for a physical allocation slot. Several transient resources with
/// non-overlapping lifetimes may map to the same slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PhysicalResourceId(pub(crate) usize);

/// A resource the graph knows about. Physical storage is materialized lazily
/// during execution; until then the resource is purely declarative.
#[derive(Debug)]
pub struct RenderGraphResource {
    id: RenderGraphResourceId,
    pub(crate) name: RenderGraphResourceName,
    pub(crate) descriptor: ResourceDescriptor,
    pub(crate) is_transient: bool,
    pub(crate) is_used_externally: bool,
    pub(crate) is_renderable: bool,
    pub(crate) is_removed: bool,
}

impl RenderGraphResource {
    pub(crate) fn new(
        id: RenderGraphResourceId,
        name: RenderGraphResourceName,
        descriptor: ResourceDescriptor,
        is_transient: bool,
        is_used_externally: bool,
    ) -> Self {
        let is_renderable = descriptor
            .usage_flags
            .intersects(ResourceUsageFlags::RENDER_TARGET | ResourceUsageFlags::DEPTH_STENCIL);

        RenderGraphResource {
            id,
            name,
            descriptor,
            is_transient,
            is_used_externally,
            is_renderable,
            is_removed: false,
        }
    }

    pub fn id(&self) -> RenderGraphResourceId {
        self.id
    }

    pub fn name(&self) -> RenderGraphResourceName {
        self.name
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn is_transient(&self) -> bool {
        self.is_transient
    }

    /// Produced or consumed outside the graph (e.g. a swapchain target).
    /// Never aliased, always gets a dedicated allocation.
    pub fn is_used_externally(&self) -> bool {
        self.is_used_externally
    }

    pub fn is_renderable(&self) -> bool {
        self.is_renderable
    }

    /// May this resource's storage be shared with another?
    pub(crate) fn can_be_aliased(&self) -> bool {
        self.is_transient && !self.is_used_externally
    }
}

/// Pass-index interval a resource is alive for within a compiled schedule
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResourceLifetime {
    pub first_use: usize,
    pub last_use: usize,
}

impl ResourceLifetime {
    pub fn overlaps(
        &self,
        other: &ResourceLifetime,
    ) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }
}

#[derive(Debug)]
enum PhysicalResourceState {
    Materialized(Box<dyn PhysicalResource>),
    Released,
}

/// Owns a backend object for the duration of its binding. The wrapped object
/// is released exactly once: either explicitly, or on drop when the cache
/// evicts the handle. Any access after release is a lifetime-tracking bug
/// and surfaces as `UseAfterRelease`.
#[derive(Debug)]
pub struct PhysicalResourceHandle {
    descriptor: ResourceDescriptor,
    state: PhysicalResourceState,
}

impl PhysicalResourceHandle {
    pub(crate) fn new(
        descriptor: ResourceDescriptor,
        physical: Box<dyn PhysicalResource>,
    ) -> Self {
        PhysicalResourceHandle {
            descriptor,
            state: PhysicalResourceState::Materialized(physical),
        }
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub fn payload(&self) -> StreetsResult<&dyn PhysicalResource> {
        match &self.state {
            PhysicalResourceState::Materialized(physical) => Ok(physical.as_ref()),
            PhysicalResourceState::Released => Err(StreetsError::UseAfterRelease(format!(
                "access of released physical resource {:?}",
                self.descriptor
            ))),
        }
    }

    pub fn is_released(&self) -> bool {
        matches!(self.state, PhysicalResourceState::Released)
    }

    pub fn release(&mut self) -> StreetsResult<()> {
        match std::mem::replace(&mut self.state, PhysicalResourceState::Released) {
            PhysicalResourceState::Materialized(mut physical) => {
                physical.release();
                Ok(())
            }
            PhysicalResourceState::Released => Err(StreetsError::UseAfterRelease(format!(
                "double release of physical resource {:?}",
                self.descriptor
            ))),
        }
    }
}

impl Drop for PhysicalResourceHandle {
    fn drop(&mut self) {
        if let PhysicalResourceState::Materialized(physical) = &mut self.state {
            log::trace!("release physical resource on drop {:?}", self.descriptor);
            physical.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streets_api::headless::HeadlessResourceBuilder;
    use streets_api::{PhysicalResourceBuilder, ResourceFormat};

    fn test_handle(builder: &HeadlessResourceBuilder) -> PhysicalResourceHandle {
        let descriptor = ResourceDescriptor::texture_2d(
            4,
            4,
            ResourceFormat::Rgba8Unorm,
            ResourceUsageFlags::SAMPLED,
        );
        let physical = builder.create_from_descriptor(&descriptor).unwrap();
        PhysicalResourceHandle::new(descriptor, physical)
    }

    #[test]
    fn release_is_exactly_once() {
        let builder = HeadlessResourceBuilder::default();
        let mut handle = test_handle(&builder);

        assert!(handle.payload().is_ok());
        handle.release().unwrap();
        assert_eq!(builder.alive_count(), 0);

        assert!(matches!(
            handle.payload(),
            Err(StreetsError::UseAfterRelease(_))
        ));
        assert!(matches!(
            handle.release(),
            Err(StreetsError::UseAfterRelease(_))
        ));
    }

    #[test]
    fn drop_releases_backend_object() {
        let builder = HeadlessResourceBuilder::default();
        {
            let _handle = test_handle(&builder);
            assert_eq!(builder.alive_count(), 1);
        }
        assert_eq!(builder.alive_count(), 0);
    }

    #[test]
    fn lifetime_overlap() {
        let a = ResourceLifetime {
            first_use: 0,
            last_use: 2,
        };
        let b = ResourceLifetime {
            first_use: 2,
            last_use: 5,
        };
        let c = ResourceLifetime {
            first_use: 3,
            last_use: 4,
        };

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&c));
        assert!(!a.overlaps(&c));
    }
}
