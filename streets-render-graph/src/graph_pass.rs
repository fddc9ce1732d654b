use crate::graph_resource::RenderGraphResourceId;
use crate::RenderGraphPassName;

/// Unique ID for a pass declared in the graph
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RenderGraphPassId(pub(crate) usize);

/// A schedulable unit of rendering or compute work. The declared reads and
/// writes are the sole source of truth for dependency computation; the
/// recorded commands (the pass callback) are opaque to the scheduler.
#[derive(Debug)]
pub struct RenderGraphPass {
    id: RenderGraphPassId,
    pub(crate) name: RenderGraphPassName,
    pub(crate) reads: Vec<RenderGraphResourceId>,
    pub(crate) writes: Vec<RenderGraphResourceId>,
    pub(crate) has_side_effects: bool,
    pub(crate) is_removed: bool,
}

impl RenderGraphPass {
    pub(crate) fn new(
        id: RenderGraphPassId,
        name: RenderGraphPassName,
        reads: Vec<RenderGraphResourceId>,
        writes: Vec<RenderGraphResourceId>,
    ) -> Self {
        RenderGraphPass {
            id,
            name,
            reads,
            writes,
            has_side_effects: false,
            is_removed: false,
        }
    }

    pub fn id(&self) -> RenderGraphPassId {
        self.id
    }

    pub fn name(&self) -> RenderGraphPassName {
        self.name
    }

    pub fn reads(&self) -> &[RenderGraphResourceId] {
        &self.reads
    }

    pub fn writes(&self) -> &[RenderGraphResourceId] {
        &self.writes
    }

    /// Externally observable side effects (debug output, picking readback).
    /// Keeps the pass in the schedule even when nothing consumes it.
    pub fn has_side_effects(&self) -> bool {
        self.has_side_effects
    }

    pub(crate) fn references(
        &self,
        resource: RenderGraphResourceId,
    ) -> bool {
        self.reads.contains(&resource) || self.writes.contains(&resource)
    }

    /// A pass with no writes has no consumers and is dead code unless it was
    /// explicitly marked as having side effects
    pub(crate) fn is_live(&self) -> bool {
        !self.is_removed && (!self.writes.is_empty() || self.has_side_effects)
    }
}
