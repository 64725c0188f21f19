//! Image storage backends.

mod memory;

pub use memory::InMemoryImageStorage;
