use crate::graph_builder::RenderGraphBuilder;
use crate::graph_pass::RenderGraphPassId;
use crate::graph_resource::{PhysicalResourceId, RenderGraphResourceId, ResourceLifetime};
use fnv::{FnvHashMap, FnvHashSet};
use streets_api::{ResourceDescriptor, StreetsError, StreetsResult};
use streets_base::FifoQueue;

/// A physical allocation slot produced by the aliasing pass. A persistent
/// slot is owned by exactly one non-transient or externally-used resource;
/// a transient slot may be shared by several resources whose lifetime
/// intervals don't overlap.
#[derive(Debug, Clone)]
pub(crate) struct PhysicalSlot {
    pub(crate) descriptor: ResourceDescriptor,
    pub(crate) owner: Option<RenderGraphResourceId>,
    #[allow(dead_code)]
    pub(crate) first_use: usize,
    pub(crate) last_use: usize,
}

struct DependencyEdges {
    outgoing: Vec<Vec<usize>>,
    indegree: Vec<usize>,
}

//
// Derive pass-to-pass edges from the declared read/write sets. An edge A->B
// exists iff A writes a resource that B reads. Writes are the only way to
// produce a new version of a resource, so per resource at most one pure
// producer and at most one modifier (a pass reading and writing it) can be
// ordered; anything beyond that has no read ordering the writes and is a
// declaration error.
//
#[profiling::function]
fn build_dependency_edges(graph: &RenderGraphBuilder) -> StreetsResult<DependencyEdges> {
    let pass_count = graph.passes.len();
    let mut edge_set = FnvHashSet::<(usize, usize)>::default();

    for resource in &graph.resources {
        if resource.is_removed {
            continue;
        }
        let resource_id = resource.id();

        let mut writers = Vec::default();
        let mut readers = Vec::default();
        for pass in &graph.passes {
            if !pass.is_live() {
                continue;
            }
            if pass.writes().contains(&resource_id) {
                writers.push(pass);
            }
            if pass.reads().contains(&resource_id) {
                readers.push(pass);
            }
        }

        let pure_writers = writers
            .iter()
            .filter(|pass| !pass.reads().contains(&resource_id))
            .count();
        let modifiers = writers.len() - pure_writers;
        if pure_writers > 1 || modifiers > 1 {
            let writer_names: Vec<String> =
                writers.iter().map(|pass| pass.name().to_string()).collect();
            log::warn!(
                "Conflicting writes to resource {:?} by passes {:?} with no intervening read",
                resource.name(),
                writer_names
            );
            return Err(StreetsError::AmbiguousWriteOrder {
                resource: resource.name().to_string(),
                writers: writer_names,
            });
        }

        for writer in &writers {
            for reader in &readers {
                if writer.id() != reader.id() {
                    edge_set.insert((writer.id().0, reader.id().0));
                }
            }
        }
    }

    let mut outgoing = vec![Vec::default(); pass_count];
    let mut indegree = vec![0usize; pass_count];
    for (from, to) in edge_set {
        outgoing[from].push(to);
        indegree[to] += 1;
    }

    // Hash set iteration order is arbitrary, keep edge retirement stable
    for list in &mut outgoing {
        list.sort_unstable();
    }

    Ok(DependencyEdges { outgoing, indegree })
}

//
// Kahn's algorithm over the live passes, with a FIFO frontier so that
// independent passes keep their registration order. Dead passes (no writes,
// no side effects) never enter the frontier.
//
#[profiling::function]
fn determine_pass_order(
    graph: &RenderGraphBuilder,
    edges: DependencyEdges,
) -> StreetsResult<Vec<RenderGraphPassId>> {
    let mut indegree = edges.indegree;
    let mut frontier = FifoQueue::default();

    let mut live_count = 0;
    for pass in &graph.passes {
        if !pass.is_live() {
            if !pass.is_removed {
                log::trace!(
                    "Cull pass {:?} {:?}, no writes and no side effects",
                    pass.id(),
                    pass.name()
                );
            }
            continue;
        }

        live_count += 1;
        if indegree[pass.id().0] == 0 {
            frontier.push(pass.id());
        }
    }

    let mut ordered = Vec::with_capacity(live_count);
    while let Some(pass_id) = frontier.pop() {
        ordered.push(pass_id);
        for &downstream in &edges.outgoing[pass_id.0] {
            indegree[downstream] -= 1;
            if indegree[downstream] == 0 {
                frontier.push(RenderGraphPassId(downstream));
            }
        }
    }

    if ordered.len() < live_count {
        let scheduled: FnvHashSet<RenderGraphPassId> = ordered.iter().copied().collect();
        let unresolved_passes: Vec<String> = graph
            .passes
            .iter()
            .filter(|pass| pass.is_live() && !scheduled.contains(&pass.id()))
            .map(|pass| pass.name().to_string())
            .collect();
        log::warn!(
            "Found cycle in graph, unresolved passes: {:?}",
            unresolved_passes
        );
        return Err(StreetsError::CyclicDependency { unresolved_passes });
    }

    Ok(ordered)
}

//
// For every resource referenced by the schedule, compute the pass-index
// interval spanning its earliest and latest use
//
#[profiling::function]
fn determine_lifetimes(
    graph: &RenderGraphBuilder,
    order: &[RenderGraphPassId],
) -> FnvHashMap<RenderGraphResourceId, ResourceLifetime> {
    let mut lifetimes = FnvHashMap::<RenderGraphResourceId, ResourceLifetime>::default();

    for (pass_index, &pass_id) in order.iter().enumerate() {
        let pass = &graph.passes[pass_id.0];
        for &resource in pass.reads().iter().chain(pass.writes().iter()) {
            lifetimes
                .entry(resource)
                .and_modify(|lifetime| lifetime.last_use = pass_index)
                .or_insert(ResourceLifetime {
                    first_use: pass_index,
                    last_use: pass_index,
                });
        }
    }

    lifetimes
}

//
// Greedy interval allocation: walk resources in first-use order; a transient
// resource takes the first transient slot whose interval has already closed
// and whose descriptor is alias-compatible, otherwise a new slot. Dedicated
// slots for non-transient/external resources are never handed out for reuse.
//
#[profiling::function]
fn assign_physical_resources(
    graph: &RenderGraphBuilder,
    lifetimes: &FnvHashMap<RenderGraphResourceId, ResourceLifetime>,
) -> (
    FnvHashMap<RenderGraphResourceId, PhysicalResourceId>,
    Vec<PhysicalSlot>,
) {
    log::trace!("-- Assign physical resources --");

    let mut used: Vec<(RenderGraphResourceId, ResourceLifetime)> = lifetimes
        .iter()
        .map(|(&resource_id, &lifetime)| (resource_id, lifetime))
        .collect();
    used.sort_by_key(|&(resource_id, lifetime)| (lifetime.first_use, resource_id.0));

    let mut slots = Vec::<PhysicalSlot>::default();
    let mut resource_to_physical =
        FnvHashMap::<RenderGraphResourceId, PhysicalResourceId>::default();

    for (resource_id, lifetime) in used {
        let resource = &graph.resources[resource_id.0];

        if !resource.can_be_aliased() {
            let slot_id = PhysicalResourceId(slots.len());
            slots.push(PhysicalSlot {
                descriptor: resource.descriptor.clone(),
                owner: Some(resource_id),
                first_use: lifetime.first_use,
                last_use: lifetime.last_use,
            });
            log::trace!(
                "  Dedicated {:?} -> {:?} used in passes [{}:{}]",
                resource.name(),
                slot_id,
                lifetime.first_use,
                lifetime.last_use
            );
            resource_to_physical.insert(resource_id, slot_id);
            continue;
        }

        let mut assigned = None;
        for (slot_index, slot) in slots.iter_mut().enumerate() {
            if slot.owner.is_some() {
                continue;
            }
            if slot.last_use < lifetime.first_use && slot.descriptor.try_merge(&resource.descriptor)
            {
                slot.last_use = lifetime.last_use;
                assigned = Some(PhysicalResourceId(slot_index));
                log::trace!(
                    "  Alias {:?} -> {:?} used in passes [{}:{}]",
                    resource.name(),
                    slot_index,
                    lifetime.first_use,
                    lifetime.last_use
                );
                break;
            }
        }

        let slot_id = assigned.unwrap_or_else(|| {
            let slot_id = PhysicalResourceId(slots.len());
            slots.push(PhysicalSlot {
                descriptor: resource.descriptor.clone(),
                owner: None,
                first_use: lifetime.first_use,
                last_use: lifetime.last_use,
            });
            log::trace!(
                "  Transient (create new) {:?} -> {:?} used in passes [{}:{}]",
                resource.name(),
                slot_id,
                lifetime.first_use,
                lifetime.last_use
            );
            slot_id
        });

        resource_to_physical.insert(resource_id, slot_id);
    }

    (resource_to_physical, slots)
}

/// The compiled output for one graph topology: a deterministic pass order,
/// the resource lifetime table, and the resource-to-slot aliasing map. Does
/// not allocate anything; materialization happens during execution.
pub struct RenderGraphPlan {
    pub(crate) pass_execution_order: Vec<RenderGraphPassId>,
    pub(crate) pass_to_index: FnvHashMap<RenderGraphPassId, usize>,
    pub(crate) lifetimes: FnvHashMap<RenderGraphResourceId, ResourceLifetime>,
    pub(crate) resource_to_physical: FnvHashMap<RenderGraphResourceId, PhysicalResourceId>,
    pub(crate) physical_slots: Vec<PhysicalSlot>,
}

impl RenderGraphPlan {
    #[profiling::function]
    pub(crate) fn new(graph: &RenderGraphBuilder) -> StreetsResult<RenderGraphPlan> {
        log::trace!("-- Build render graph plan --");

        let edges = build_dependency_edges(graph)?;
        let pass_execution_order = determine_pass_order(graph, edges)?;

        log::trace!("Execution order of live passes:");
        for pass_id in &pass_execution_order {
            log::trace!("  Pass {:?} {:?}", pass_id, graph.passes[pass_id.0].name());
        }

        let lifetimes = determine_lifetimes(graph, &pass_execution_order);
        let (resource_to_physical, physical_slots) =
            assign_physical_resources(graph, &lifetimes);

        let pass_to_index = pass_execution_order
            .iter()
            .enumerate()
            .map(|(index, &pass_id)| (pass_id, index))
            .collect();

        Ok(RenderGraphPlan {
            pass_execution_order,
            pass_to_index,
            lifetimes,
            resource_to_physical,
            physical_slots,
        })
    }

    /// Pass ids in execution order
    pub fn schedule(&self) -> &[RenderGraphPassId] {
        &self.pass_execution_order
    }

    pub fn pass_index(
        &self,
        pass: RenderGraphPassId,
    ) -> Option<usize> {
        self.pass_to_index.get(&pass).copied()
    }

    /// Lifetime interval of a resource, if any scheduled pass references it
    pub fn lifetime(
        &self,
        resource: RenderGraphResourceId,
    ) -> Option<ResourceLifetime> {
        self.lifetimes.get(&resource).copied()
    }

    /// Physical slot assigned to a resource. Aliased resources map to the
    /// same slot.
    pub fn physical_resource(
        &self,
        resource: RenderGraphResourceId,
    ) -> Option<PhysicalResourceId> {
        self.resource_to_physical.get(&resource).copied()
    }

    /// Number of distinct physical allocations the schedule needs
    pub fn physical_slot_count(&self) -> usize {
        self.physical_slots.len()
    }

    pub(crate) fn slot(
        &self,
        slot: PhysicalResourceId,
    ) -> &PhysicalSlot {
        &self.physical_slots[slot.0]
    }
}
