//! WordCount 工具：统计空白分隔的词数

use async_trait::async_trait;

use crate::tools::Tool;

pub struct WordCountTool;

#[async_trait]
impl Tool for WordCountTool {
    fn name(&self) -> &str {
        "word_count"
    }

    fn description(&self) -> &str {
        "Counts words in a sentence. Input: a string of text"
    }

    async fn execute(&self, input: &str) -> Result<String, String> {
        Ok(input.split_whitespace().count().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_words() {
        let out = WordCountTool
            .execute("Agentic AI changes software design forever")
            .await
            .unwrap();
        assert_eq!(out, "6");
        assert_eq!(WordCountTool.execute("   ").await.unwrap(), "0");
    }
}
