//! 长期记忆：嵌入向量 + 记录日志，按余弦相似度检索
//!
//! insert(content, topic) 嵌入并归一化后追加到索引，同时追加一条 MemoryRecord；
//! 索引与记录日志在同一把锁下追加，第 i 个向量始终对应第 i 条记录。只追加，不修改、不删除。
//! retrieve(query, top_k, threshold) 先取内积最高的 top_k 个候选，再严格过滤 score > threshold。

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::SeedMemory;
use crate::core::AgentError;
use crate::llm::EmbeddingProvider;
use crate::memory::index::{FlatIndex, VectorIndex};

/// 一条长期记忆
#[derive(Debug, Clone, Serialize)]
pub struct MemoryRecord {
    pub content: String,
    pub topic: String,
    pub timestamp: DateTime<Local>,
}

/// 检索命中：记录与相似度
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMemory {
    pub record: MemoryRecord,
    pub score: f32,
}

struct Inner {
    index: Box<dyn VectorIndex>,
    records: Vec<MemoryRecord>,
}

/// 向量长期记忆存储
pub struct MemoryStore {
    embedder: Arc<dyn EmbeddingProvider>,
    inner: RwLock<Inner>,
}

/// 归一化到单位长度；维度不符或零向量返回错误。不做钳制
fn normalize(vector: Vec<f32>, dimension: usize) -> Result<Vec<f32>, AgentError> {
    if vector.len() != dimension {
        return Err(AgentError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Err(AgentError::EmbeddingError(format!(
            "cannot normalize embedding with norm {}",
            norm
        )));
    }
    Ok(vector.into_iter().map(|x| x / norm).collect())
}

impl MemoryStore {
    /// 使用精确内积索引（FlatIndex）
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, dimension: usize) -> Self {
        Self::with_index(embedder, Box::new(FlatIndex::new(dimension)))
    }

    /// 使用自定义索引实现（须为空索引）
    pub fn with_index(embedder: Arc<dyn EmbeddingProvider>, index: Box<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            inner: RwLock::new(Inner {
                index,
                records: Vec::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn dimension(&self) -> usize {
        self.read().index.dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, AgentError> {
        let raw = self
            .embedder
            .embed_sync(text)
            .map_err(AgentError::EmbeddingError)?;
        normalize(raw, self.dimension())
    }

    /// 嵌入并追加一条记忆
    pub fn insert(&self, content: &str, topic: &str) -> Result<(), AgentError> {
        let vector = self.embed(content)?;
        let record = MemoryRecord {
            content: content.to_string(),
            topic: topic.to_string(),
            timestamp: Local::now(),
        };
        let mut inner = self.write();
        inner.index.add(vector);
        inner.records.push(record);
        tracing::debug!(topic, total = inner.records.len(), "memory stored");
        Ok(())
    }

    /// 写入种子知识，返回写入条数；任一失败即返回错误
    pub fn seed(&self, seeds: &[SeedMemory]) -> Result<usize, AgentError> {
        for seed in seeds {
            self.insert(&seed.content, &seed.topic)?;
        }
        Ok(seeds.len())
    }

    /// 检索相关记忆（含分数）；空存储直接返回空，不调用嵌入函数
    pub fn retrieve_scored(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredMemory>, AgentError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embed(query)?;
        let inner = self.read();
        let hits = inner
            .index
            .search(&query_vec, top_k)
            .into_iter()
            .filter(|(_, score)| *score > threshold)
            .filter_map(|(pos, score)| {
                inner.records.get(pos).map(|record| ScoredMemory {
                    record: record.clone(),
                    score,
                })
            })
            .collect();
        Ok(hits)
    }

    /// 检索相关记忆内容，按相似度降序
    pub fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<String>, AgentError> {
        Ok(self
            .retrieve_scored(query, top_k, threshold)?
            .into_iter()
            .map(|m| m.record.content)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 全部记录快照（按插入顺序）
    pub fn records(&self) -> Vec<MemoryRecord> {
        self.read().records.clone()
    }

    pub fn records_by_topic(&self, topic: &str) -> Vec<MemoryRecord> {
        self.read()
            .records
            .iter()
            .filter(|r| r.topic == topic)
            .cloned()
            .collect()
    }

    /// 索引与记录日志长度一致
    pub fn is_aligned(&self) -> bool {
        let inner = self.read();
        inner.index.len() == inner.records.len()
    }
}
