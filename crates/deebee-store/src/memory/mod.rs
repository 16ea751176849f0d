mod range;
mod store;

pub use store::MemoryStore;
