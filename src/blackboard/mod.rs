//! Blackboard storage for facts extracted by pipeline modules.
//!
//! This module provides the [`Blackboard`] trait and two
//! implementations: an in-memory store and a JSON-on-disk store.

mod filesystem;
mod memory;
mod traits;

pub use filesystem::FilesystemBlackboard;
pub use memory::MemoryBlackboard;
pub use traits::Blackboard;
