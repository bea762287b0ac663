use std::sync::Arc;

use crate::domain::entity::article::Article;
use crate::domain::repository::ArticleRepository;

#[derive(Debug, thiserror::Error)]
pub enum GetArticleError {
    #[error("article not found: {0}")]
    NotFound(i64),

    #[error("internal error: {0}")]
    Internal(String),
}

pub struct GetArticleUseCase {
    article_repo: Arc<dyn ArticleRepository>,
}

impl GetArticleUseCase {
    pub fn new(article_repo: Arc<dyn ArticleRepository>) -> Self {
        Self { article_repo }
    }

    pub async fn execute(&self, id: i64) -> Result<Article, GetArticleError> {
        self.article_repo
            .find_by_id(id)
            .await
            .map_err(|e| GetArticleError::Internal(e.to_string()))?
            .ok_or(GetArticleError::NotFound(id))
    }
}
