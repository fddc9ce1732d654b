use crate::graph_pass::{RenderGraphPass, RenderGraphPassId};
use crate::graph_resource::{RenderGraphResource, RenderGraphResourceId};
use crate::render_graph::RenderGraphPassCallback;
use crate::{RenderGraphPassName, RenderGraphResourceName};
use fnv::FnvHashMap;
use streets_api::{ResourceDescriptor, StreetsError, StreetsResult};

/// A collection of resource and pass declarations. Declarations happen once
/// per topology setup, not per frame; the plan compiler
/// ([`RenderGraphPlan`](crate::RenderGraphPlan)) turns them into an
/// executable schedule. Removal is tombstoned so ids stay stable.
#[derive(Default)]
pub struct RenderGraphBuilder {
    pub(crate) resources: Vec<RenderGraphResource>,
    pub(crate) passes: Vec<RenderGraphPass>,
    pub(crate) pass_callbacks: FnvHashMap<RenderGraphPassId, RenderGraphPassCallback>,
}

impl RenderGraphBuilder {
    /// Declare a resource. The descriptor is validated here and immutable
    /// afterwards.
    pub fn add_resource(
        &mut self,
        name: RenderGraphResourceName,
        descriptor: ResourceDescriptor,
        is_transient: bool,
        is_used_externally: bool,
    ) -> StreetsResult<RenderGraphResourceId> {
        descriptor.validate()?;

        let resource_id = RenderGraphResourceId(self.resources.len());
        log::trace!(
            "Add resource {:?} {:?} transient={} external={}",
            resource_id,
            name,
            is_transient,
            is_used_externally
        );

        self.resources.push(RenderGraphResource::new(
            resource_id,
            name,
            descriptor,
            is_transient,
            is_used_externally,
        ));

        Ok(resource_id)
    }

    /// Declare a pass over previously declared resources
    pub fn add_pass(
        &mut self,
        name: RenderGraphPassName,
        reads: &[RenderGraphResourceId],
        writes: &[RenderGraphResourceId],
    ) -> StreetsResult<RenderGraphPassId> {
        for &resource in reads.iter().chain(writes.iter()) {
            self.resource(resource)?;
        }

        let pass_id = RenderGraphPassId(self.passes.len());
        log::trace!(
            "Add pass {:?} {:?} reads={:?} writes={:?}",
            pass_id,
            name,
            reads,
            writes
        );

        self.passes.push(RenderGraphPass::new(
            pass_id,
            name,
            reads.to_vec(),
            writes.to_vec(),
        ));

        Ok(pass_id)
    }

    /// Record the commands to run when the pass executes
    pub fn set_pass_callback<CallbackFnT>(
        &mut self,
        pass: RenderGraphPassId,
        f: CallbackFnT,
    ) -> StreetsResult<()>
    where
        CallbackFnT: Fn(crate::render_graph::VisitPassArgs) -> StreetsResult<()> + 'static,
    {
        self.pass(pass)?;
        let old = self.pass_callbacks.insert(pass, Box::new(f));
        // If this trips, multiple callbacks were set on the pass
        assert!(old.is_none());
        Ok(())
    }

    /// Force-retain a pass that would otherwise be culled as dead code
    /// because nothing consumes its (absent) writes
    pub fn set_pass_side_effects(
        &mut self,
        pass: RenderGraphPassId,
        has_side_effects: bool,
    ) -> StreetsResult<()> {
        self.pass(pass)?;
        self.passes[pass.0].has_side_effects = has_side_effects;
        Ok(())
    }

    /// Remove a pass from the topology. Its id becomes invalid.
    pub fn remove_pass(
        &mut self,
        pass: RenderGraphPassId,
    ) -> StreetsResult<()> {
        self.pass(pass)?;

        let pass = &mut self.passes[pass.0];
        log::trace!("Remove pass {:?} {:?}", pass.id(), pass.name());
        pass.is_removed = true;
        pass.reads.clear();
        pass.writes.clear();
        self.pass_callbacks.remove(&pass.id());
        Ok(())
    }

    /// Remove a resource from the topology. Fails with `ResourceInUse` while
    /// any live pass still declares it; its physical allocation (if any) is
    /// released on the next compile.
    pub fn remove_resource(
        &mut self,
        resource: RenderGraphResourceId,
    ) -> StreetsResult<()> {
        self.resource(resource)?;

        for pass in &self.passes {
            if !pass.is_removed && pass.references(resource) {
                return Err(StreetsError::ResourceInUse(format!(
                    "resource {:?} is declared by pass {:?}",
                    self.resources[resource.0].name(),
                    pass.name()
                )));
            }
        }

        log::trace!(
            "Remove resource {:?} {:?}",
            resource,
            self.resources[resource.0].name()
        );
        self.resources[resource.0].is_removed = true;
        Ok(())
    }

    pub fn resource(
        &self,
        resource: RenderGraphResourceId,
    ) -> StreetsResult<&RenderGraphResource> {
        match self.resources.get(resource.0) {
            Some(r) if !r.is_removed => Ok(r),
            _ => Err(StreetsError::InvalidHandle(format!(
                "resource id {} is not registered",
                resource.0
            ))),
        }
    }

    pub fn pass(
        &self,
        pass: RenderGraphPassId,
    ) -> StreetsResult<&RenderGraphPass> {
        match self.passes.get(pass.0) {
            Some(p) if !p.is_removed => Ok(p),
            _ => Err(StreetsError::InvalidHandle(format!(
                "pass id {} is not registered",
                pass.0
            ))),
        }
    }
}
