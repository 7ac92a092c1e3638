//! Transport slots and the in-process transport.

pub mod memory;
pub(crate) mod slot;

pub use memory::MemoryTransport;
