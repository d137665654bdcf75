//! 嵌入函数：供向量长期记忆（MemoryStore）使用
//!
//! - OpenAiEmbedder：调用 OpenAI 兼容的 /embeddings 端点
//! - HashingEmbedder：本地确定性嵌入（小写词特征哈希到固定维度），无 API Key 时兜底，也用于测试

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::embeddings::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;

use crate::config::EmbeddingSection;
use crate::llm::openai::openai_config;

/// 同步嵌入接口；MemoryStore 的读写都是同步调用
pub trait EmbeddingProvider: Send + Sync {
    /// 将文本编码为向量；失败时返回错误字符串。返回值不要求已归一化
    fn embed_sync(&self, text: &str) -> Result<Vec<f32>, String>;
}

/// OpenAI 兼容的 /embeddings 端点；请求时指定输出维度以匹配 MemoryStore
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedder {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>, dimension: usize) -> Self {
        Self {
            client: Client::with_config(openai_config(base_url, api_key)),
            model: model.to_string(),
            dimension,
        }
    }

    pub async fn embed_async(&self, text: &str) -> Result<Vec<f32>, String> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .dimensions(self.dimension as u32)
            .build()
            .map_err(|e| e.to_string())?;
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;
        response
            .data
            .into_iter()
            .next()
            .map(|e| e.embedding)
            .ok_or_else(|| "empty embedding response".to_string())
    }
}

impl EmbeddingProvider for OpenAiEmbedder {
    /// 需在多线程 tokio 运行时内调用
    fn embed_sync(&self, text: &str) -> Result<Vec<f32>, String> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| e.to_string())?;
        tokio::task::block_in_place(|| handle.block_on(self.embed_async(text)))
    }
}

/// 本地特征哈希嵌入：每个小写词（长度 > 1）按 FNV-1a 落入一个桶并计数
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

fn tokenize_lower(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.chars().count() > 1)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed_sync(&self, text: &str) -> Result<Vec<f32>, String> {
        let mut vec = vec![0.0f32; self.dimension];
        for word in tokenize_lower(text) {
            let bucket = (fnv1a(word.as_bytes()) % self.dimension as u64) as usize;
            vec[bucket] += 1.0;
        }
        Ok(vec)
    }
}

/// 从 [embedding] 配置创建嵌入提供方：启用且有 OPENAI_API_KEY 时走远端，否则用本地 HashingEmbedder
pub fn create_embedder_from_config(cfg: &EmbeddingSection) -> Arc<dyn EmbeddingProvider> {
    let key = std::env::var("OPENAI_API_KEY").ok();
    let has_key = key
        .as_deref()
        .map(|k| !k.is_empty() && k != "sk-placeholder")
        .unwrap_or(false);
    if cfg.enabled && has_key {
        tracing::info!("Using remote embeddings ({})", cfg.model);
        Arc::new(OpenAiEmbedder::new(
            cfg.base_url.as_deref(),
            &cfg.model,
            key.as_deref(),
            cfg.dimension,
        ))
    } else {
        tracing::debug!("remote embedding skipped, using local hashing embedder");
        Arc::new(HashingEmbedder::new(cfg.dimension))
    }
}
