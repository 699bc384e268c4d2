use thiserror::Error;

/// Errors surfaced by fallible container operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A constructor or setter was handed a value outside its domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The requested or grown capacity exceeds the supported maximum.
    #[error("capacity {0} exceeds the supported maximum")]
    CapacityOverflow(usize),
    /// The key is not present in the container.
    #[error("key not found")]
    NotFound,
    /// The allocator refused a request.
    #[error("allocation of {0} bytes failed")]
    AllocationFailure(usize),
}
