// Adapters layer: concrete fact store implementations.

pub mod aggregate;
pub mod memory;

pub use memory::MemoryStore;
