use crate::{ResourceDescriptor, StreetsResult};

/// A GPU object created by a backend. The render graph treats it as opaque:
/// it only ever releases it (exactly once) or hands it back to the pass
/// callback that knows which backend is in use.
pub trait PhysicalResource: std::fmt::Debug {
    /// The concrete backend object, downcast by the code that installed the
    /// matching [`PhysicalResourceBuilder`]
    fn as_any(&self) -> &dyn std::any::Any;

    /// Free the backend object. The graph guarantees this is called at most
    /// once; a backend does not need to guard against double release.
    fn release(&mut self);
}

/// Capability contract implemented per backend. The render graph depends
/// only on this interface, so a WebGL-style immediate backend and a
/// command-buffer backend plug in the same way.
pub trait PhysicalResourceBuilder {
    /// Materialize a descriptor into a real GPU object. Fails with
    /// [`StreetsError::BackendAllocation`](crate::StreetsError) when the
    /// backend cannot satisfy the descriptor.
    fn create_from_descriptor(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> StreetsResult<Box<dyn PhysicalResource>>;
}

impl<T: PhysicalResourceBuilder + ?Sized> PhysicalResourceBuilder for std::sync::Arc<T> {
    fn create_from_descriptor(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> StreetsResult<Box<dyn PhysicalResource>> {
        (**self).create_from_descriptor(descriptor)
    }
}
