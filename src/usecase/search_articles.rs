use std::sync::Arc;

use crate::domain::entity::article::Article;
use crate::domain::entity::article_document::ArticleQuery;
use crate::domain::error::SearchGatewayError;
use crate::domain::repository::SearchGateway;

#[derive(Debug, thiserror::Error)]
pub enum SearchArticlesError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("search failed: {0}")]
    Gateway(#[from] SearchGatewayError),
}

/// SearchArticlesUseCase はエイリアスに対してキーワード検索を行う。
/// 結果は常に公開済み記事に絞り込まれる。
pub struct SearchArticlesUseCase {
    gateway: Arc<dyn SearchGateway>,
    alias: String,
    size: u32,
}

impl SearchArticlesUseCase {
    pub fn new(gateway: Arc<dyn SearchGateway>, alias: impl Into<String>, size: u32) -> Self {
        Self {
            gateway,
            alias: alias.into(),
            size,
        }
    }

    pub async fn execute(&self, keyword: &str) -> Result<Vec<Article>, SearchArticlesError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SearchArticlesError::InvalidQuery(
                "keyword must not be empty".to_string(),
            ));
        }

        let query = ArticleQuery::published(keyword, self.size);
        Ok(self.gateway.search(&self.alias, &query).await?)
    }
}
