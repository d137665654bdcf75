//! 向量索引：只追加，按内积检索
//!
//! MemoryStore 只依赖 VectorIndex trait；FlatIndex 为精确暴力检索，可替换为 ANN 实现而不改变契约。

/// 只追加的向量索引。第 i 次 add 的向量位置为 i
pub trait VectorIndex: Send + Sync {
    fn dimension(&self) -> usize;

    /// 追加一个向量（调用方保证维度正确）
    fn add(&mut self, vector: Vec<f32>);

    /// 返回内积最高的至多 k 个 (位置, 分数)，分数降序
    fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 精确内积索引（暴力遍历）
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }
}

fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn add(&mut self, vector: Vec<f32>) {
        self.vectors.push(vector);
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, inner_product(query, v)))
            .collect();
        // 稳定排序：同分按插入顺序
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_orders_by_score_desc() {
        let mut idx = FlatIndex::new(2);
        idx.add(vec![1.0, 0.0]);
        idx.add(vec![0.0, 1.0]);
        idx.add(vec![0.6, 0.8]);
        let hits = idx.search(&[0.0, 1.0], 3);
        let positions: Vec<usize> = hits.iter().map(|(i, _)| *i).collect();
        assert_eq!(positions, vec![1, 2, 0]);
        assert!((hits[0].1 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_caps_at_k_and_ties_keep_insertion_order() {
        let mut idx = FlatIndex::new(2);
        idx.add(vec![1.0, 0.0]);
        idx.add(vec![1.0, 0.0]);
        idx.add(vec![1.0, 0.0]);
        let hits = idx.search(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits[1].0, 1);
        assert!(idx.search(&[1.0, 0.0], 0).is_empty());
    }
}
