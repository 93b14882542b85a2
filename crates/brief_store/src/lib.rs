pub mod memory;

pub use memory::{default_topics, MemoryStore, NoopSender};
