//! Lowest level crate of `streets`. Includes small containers shared by the
//! renderer crates.

pub mod queue;
pub use queue::FifoQueue;
