//! LLM 层：推理服务客户端抽象、各角色客户端工厂、嵌入函数

pub mod embedding;
pub mod factory;
pub mod mock;
pub mod openai;
pub mod traits;

pub use embedding::{create_embedder_from_config, EmbeddingProvider, HashingEmbedder, OpenAiEmbedder};
pub use factory::{create_deepseek_client, create_llm_for_role, create_role_clients, AgentRole, RoleClients};
pub use mock::{FailingLlmClient, MockLlmClient, RecordedCall};
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::LlmClient;
