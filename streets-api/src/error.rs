pub type StreetsResult<T> = Result<T, StreetsError>;

/// Generic error that contains all the different kinds of errors that may
/// occur when declaring, compiling, or executing a render graph
#[derive(Debug, Clone, PartialEq)]
pub enum StreetsError {
    /// The backend could not satisfy a resource descriptor (unsupported
    /// format, out of memory, ...). The frame aborts and the resource stays
    /// unmaterialized, so retrying next frame is valid.
    BackendAllocation(String),

    /// The declared passes form a cycle. Declaration-time logic error, the
    /// graph is not executable until the caller fixes the declarations.
    CyclicDependency { unresolved_passes: Vec<String> },

    /// Two passes write the same resource with no read ordering them.
    /// Declaration-time logic error.
    AmbiguousWriteOrder {
        resource: String,
        writers: Vec<String>,
    },

    /// A physical resource was accessed or released after it was already
    /// released. Indicates a lifetime-tracking bug.
    UseAfterRelease(String),

    /// A resource descriptor failed construction-time validation.
    InvalidDescriptor(String),

    /// A resource was removed while a live pass still declares it.
    ResourceInUse(String),

    /// An id that was never registered with the graph, or was removed.
    InvalidHandle(String),
}

impl std::error::Error for StreetsError {}

impl core::fmt::Display for StreetsError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match self {
            StreetsError::BackendAllocation(ref e) => {
                write!(fmt, "backend allocation failed: {}", e)
            }
            StreetsError::CyclicDependency {
                ref unresolved_passes,
            } => write!(
                fmt,
                "render graph has a cycle, unresolved passes: {:?}",
                unresolved_passes
            ),
            StreetsError::AmbiguousWriteOrder {
                ref resource,
                ref writers,
            } => write!(
                fmt,
                "ambiguous write order on resource {:?}, written by {:?} with no intervening read",
                resource, writers
            ),
            StreetsError::UseAfterRelease(ref e) => {
                write!(fmt, "physical resource used after release: {}", e)
            }
            StreetsError::InvalidDescriptor(ref e) => {
                write!(fmt, "invalid resource descriptor: {}", e)
            }
            StreetsError::ResourceInUse(ref e) => {
                write!(fmt, "resource still referenced by a pass: {}", e)
            }
            StreetsError::InvalidHandle(ref e) => write!(fmt, "invalid handle: {}", e),
        }
    }
}

impl From<&str> for StreetsError {
    fn from(str: &str) -> Self {
        StreetsError::BackendAllocation(str.to_string())
    }
}

impl From<String> for StreetsError {
    fn from(string: String) -> Self {
        StreetsError::BackendAllocation(string)
    }
}
