//! Backend abstraction for the `streets` renderer. This crate defines the
//! backend-agnostic description of GPU resources (textures and buffers), the
//! error taxonomy shared by the renderer crates, and the narrow contract
//! through which the render graph materializes physical resources on a
//! concrete backend.
//!
//! A backend implements [`PhysicalResourceBuilder`]; everything above this
//! crate treats the objects it returns as opaque handles. The [`headless`]
//! backend allocates nothing and backs tests and CPU-only runs.

mod error;
pub use error::StreetsError;
pub use error::StreetsResult;

mod types;
pub use types::ResourceDescriptor;
pub use types::ResourceFormat;
pub use types::ResourceKind;
pub use types::ResourceUsageFlags;

mod physical_resource;
pub use physical_resource::PhysicalResource;
pub use physical_resource::PhysicalResourceBuilder;

pub mod headless;
