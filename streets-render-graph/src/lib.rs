//! Declarative render graph for the `streets` renderer.
//!
//! The application declares resources (textures and buffers) and passes that
//! read/write them. The graph compiles those declarations once per topology
//! change into an execution plan: a topologically valid, deterministic pass
//! order plus a resource lifetime table that lets transient resources share
//! physical allocations when their lifetimes don't overlap. Per-frame
//! execution replays the cached plan against whatever backend implements
//! [`streets_api::PhysicalResourceBuilder`].

mod graph_resource;
pub use graph_resource::PhysicalResourceHandle;
pub use graph_resource::PhysicalResourceId;
pub use graph_resource::RenderGraphResource;
pub use graph_resource::RenderGraphResourceId;
pub use graph_resource::ResourceLifetime;

mod graph_pass;
pub use graph_pass::RenderGraphPass;
pub use graph_pass::RenderGraphPassId;

mod graph_builder;
pub use graph_builder::RenderGraphBuilder;

mod graph_plan;
pub use graph_plan::RenderGraphPlan;

mod graph_cache;
pub use graph_cache::RenderGraphCache;

mod render_graph;
pub use render_graph::RenderGraph;
pub use render_graph::RenderGraphContext;
pub use render_graph::RenderGraphPassCallback;
pub use render_graph::VisitPassArgs;


pub type RenderGraphResourceName = &'static str;
pub type RenderGraphPassName = &'static str;
