//! 记忆层：LLM 消息类型、向量索引、长期记忆存储

pub mod conversation;
pub mod index;
pub mod long_term;

pub use conversation::{Message, Role};
pub use index::{FlatIndex, VectorIndex};
pub use long_term::{MemoryRecord, MemoryStore, ScoredMemory};
