use crate::graph_builder::RenderGraphBuilder;
use crate::graph_cache::RenderGraphCache;
use crate::graph_pass::{RenderGraphPass, RenderGraphPassId};
use crate::graph_plan::RenderGraphPlan;
use crate::graph_resource::{
    PhysicalResourceHandle, PhysicalResourceId, RenderGraphResource, RenderGraphResourceId,
};
use crate::{RenderGraphPassName, RenderGraphResourceName};
use fnv::FnvHashMap;
use streets_api::{
    PhysicalResource, PhysicalResourceBuilder, ResourceDescriptor, StreetsError, StreetsResult,
};

pub type RenderGraphPassCallback = Box<dyn Fn(VisitPassArgs) -> StreetsResult<()>>;

/// Handed to pass callbacks; resolves declared resources to the physical
/// objects bound for the current frame
#[derive(Copy, Clone)]
pub struct RenderGraphContext<'a> {
    plan: &'a RenderGraphPlan,
    bindings: &'a FnvHashMap<PhysicalResourceId, PhysicalResourceHandle>,
}

impl<'a> RenderGraphContext<'a> {
    pub fn physical_resource(
        &self,
        resource: RenderGraphResourceId,
    ) -> StreetsResult<&'a dyn PhysicalResource> {
        let slot = self.plan.physical_resource(resource).ok_or_else(|| {
            StreetsError::InvalidHandle(format!(
                "resource id {} is not part of the compiled schedule",
                resource.0
            ))
        })?;
        let handle = self.bindings.get(&slot).ok_or_else(|| {
            StreetsError::InvalidHandle(format!(
                "resource id {} is not bound at this point of the schedule",
                resource.0
            ))
        })?;
        handle.payload()
    }
}

pub struct VisitPassArgs<'a> {
    pub pass: RenderGraphPassId,
    pub graph_context: RenderGraphContext<'a>,
}

/// Owns the declared topology, the compiled plan, and the physical resource
/// cache, and drives per-frame execution against a backend. The plan is
/// recomputed only when the topology changes; per-frame execution replays
/// the cached schedule and only re-binds physical resources.
pub struct RenderGraph {
    builder: RenderGraphBuilder,
    physical_resource_builder: Box<dyn PhysicalResourceBuilder>,
    cache: RenderGraphCache,
    compiled: Option<RenderGraphPlan>,
    topology_dirty: bool,
}

impl RenderGraph {
    /// A graph for an immediate-style backend with a single frame in flight
    pub fn new(physical_resource_builder: Box<dyn PhysicalResourceBuilder>) -> Self {
        Self::with_max_frames_in_flight(physical_resource_builder, 1)
    }

    pub fn with_max_frames_in_flight(
        physical_resource_builder: Box<dyn PhysicalResourceBuilder>,
        max_frames_in_flight: u32,
    ) -> Self {
        RenderGraph {
            builder: RenderGraphBuilder::default(),
            physical_resource_builder,
            cache: RenderGraphCache::new(max_frames_in_flight),
            compiled: None,
            topology_dirty: false,
        }
    }

    //
    // Declaration API. Structural changes mark the topology dirty; the next
    // compile/execute recomputes the plan.
    //

    pub fn add_resource(
        &mut self,
        name: RenderGraphResourceName,
        descriptor: ResourceDescriptor,
        is_transient: bool,
        is_used_externally: bool,
    ) -> StreetsResult<RenderGraphResourceId> {
        let resource_id =
            self.builder
                .add_resource(name, descriptor, is_transient, is_used_externally)?;
        self.topology_dirty = true;
        Ok(resource_id)
    }

    pub fn add_pass(
        &mut self,
        name: RenderGraphPassName,
        reads: &[RenderGraphResourceId],
        writes: &[RenderGraphResourceId],
    ) -> StreetsResult<RenderGraphPassId> {
        let pass_id = self.builder.add_pass(name, reads, writes)?;
        self.topology_dirty = true;
        Ok(pass_id)
    }

    /// Recording a callback is not a structural change and does not trigger
    /// recompilation
    pub fn set_pass_callback<CallbackFnT>(
        &mut self,
        pass: RenderGraphPassId,
        f: CallbackFnT,
    ) -> StreetsResult<()>
    where
        CallbackFnT: Fn(VisitPassArgs) -> StreetsResult<()> + 'static,
    {
        self.builder.set_pass_callback(pass, f)
    }

    pub fn set_pass_side_effects(
        &mut self,
        pass: RenderGraphPassId,
        has_side_effects: bool,
    ) -> StreetsResult<()> {
        self.builder.set_pass_side_effects(pass, has_side_effects)?;
        self.topology_dirty = true;
        Ok(())
    }

    pub fn remove_pass(
        &mut self,
        pass: RenderGraphPassId,
    ) -> StreetsResult<()> {
        self.builder.remove_pass(pass)?;
        self.topology_dirty = true;
        Ok(())
    }

    pub fn remove_resource(
        &mut self,
        resource: RenderGraphResourceId,
    ) -> StreetsResult<()> {
        self.builder.remove_resource(resource)?;
        self.topology_dirty = true;
        Ok(())
    }

    pub fn resource(
        &self,
        resource: RenderGraphResourceId,
    ) -> StreetsResult<&RenderGraphResource> {
        self.builder.resource(resource)
    }

    pub fn pass(
        &self,
        pass: RenderGraphPassId,
    ) -> StreetsResult<&RenderGraphPass> {
        self.builder.pass(pass)
    }

    /// Compile the current topology, or return the cached plan if nothing
    /// structural changed. Fails before any backend call is made.
    pub fn compile(&mut self) -> StreetsResult<&RenderGraphPlan> {
        if self.topology_dirty || self.compiled.is_none() {
            log::debug!("Render graph topology changed, compiling");
            let plan = RenderGraphPlan::new(&self.builder)?;
            self.cache.release_removed(&self.builder);
            self.compiled = Some(plan);
            self.topology_dirty = false;
        }

        match self.compiled.as_ref() {
            Some(plan) => Ok(plan),
            None => unreachable!(),
        }
    }

    /// Run one frame: walk the compiled schedule, bind or create physical
    /// resources as their intervals open, and invoke pass callbacks in
    /// order. On error the frame aborts; already-executed passes keep their
    /// side effects and the frame may simply be retried.
    #[profiling::function]
    pub fn execute(&mut self) -> StreetsResult<()> {
        self.compile()?;

        let plan = match self.compiled.as_ref() {
            Some(plan) => plan,
            None => return Ok(()),
        };

        execute_plan(
            plan,
            &self.builder,
            &mut self.cache,
            self.physical_resource_builder.as_ref(),
        )
    }

    /// Advance the cache's frame counter and evict stale pooled allocations
    pub fn on_frame_complete(&mut self) {
        self.cache.on_frame_complete();
    }
}

fn execute_plan(
    plan: &RenderGraphPlan,
    graph: &RenderGraphBuilder,
    cache: &mut RenderGraphCache,
    backend: &dyn PhysicalResourceBuilder,
) -> StreetsResult<()> {
    let mut bindings = FnvHashMap::<PhysicalResourceId, PhysicalResourceHandle>::default();

    let result = visit_passes(plan, graph, cache, backend, &mut bindings);

    // Hand every binding back to the cache, also when the frame aborted, so
    // allocations survive into the next frame instead of leaking
    for (slot_id, handle) in bindings.drain() {
        match plan.slot(slot_id).owner {
            Some(owner) => cache.checkin_persistent(owner, handle),
            None => cache.checkin_transient(handle),
        }
    }

    result
}

fn visit_passes(
    plan: &RenderGraphPlan,
    graph: &RenderGraphBuilder,
    cache: &mut RenderGraphCache,
    backend: &dyn PhysicalResourceBuilder,
    bindings: &mut FnvHashMap<PhysicalResourceId, PhysicalResourceHandle>,
) -> StreetsResult<()> {
    for &pass_id in plan.schedule() {
        let pass = graph.pass(pass_id)?;

        for &resource_id in pass.reads().iter().chain(pass.writes().iter()) {
            bind_physical_resource(plan, graph, cache, backend, bindings, resource_id)?;
        }

        if let Some(callback) = graph.pass_callbacks.get(&pass_id) {
            let args = VisitPassArgs {
                pass: pass_id,
                graph_context: RenderGraphContext {
                    plan,
                    bindings: &*bindings,
                },
            };
            (callback)(args)?;
        }
    }

    Ok(())
}

fn bind_physical_resource(
    plan: &RenderGraphPlan,
    graph: &RenderGraphBuilder,
    cache: &mut RenderGraphCache,
    backend: &dyn PhysicalResourceBuilder,
    bindings: &mut FnvHashMap<PhysicalResourceId, PhysicalResourceHandle>,
    resource_id: RenderGraphResourceId,
) -> StreetsResult<()> {
    let slot_id = match plan.physical_resource(resource_id) {
        Some(slot_id) => slot_id,
        // Every resource referenced by a scheduled pass has a slot
        None => {
            return Err(StreetsError::InvalidHandle(format!(
                "resource id {} has no physical slot in the compiled plan",
                resource_id.0
            )))
        }
    };

    if bindings.contains_key(&slot_id) {
        return Ok(());
    }

    let slot = plan.slot(slot_id);
    let cached = match slot.owner {
        Some(owner) => cache.checkout_persistent(owner),
        None => cache.checkout_transient(&slot.descriptor),
    };

    let handle = match cached {
        Some(handle) => handle,
        None => {
            log::trace!(
                "  Materialize {:?} for {:?}",
                slot_id,
                graph.resources[resource_id.0].name()
            );
            let physical = backend.create_from_descriptor(&slot.descriptor)?;
            PhysicalResourceHandle::new(slot.descriptor.clone(), physical)
        }
    };

    bindings.insert(slot_id, handle);
    Ok(())
}
