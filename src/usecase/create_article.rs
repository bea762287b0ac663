use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entity::article::{normalize_title, Article, ArticleStatus};
use crate::domain::entity::user::Principal;
use crate::domain::error::SearchGatewayError;
use crate::domain::repository::{ArticleRepository, SearchGateway};
use crate::domain::service::document_mapper;

#[derive(Debug, Clone)]
pub struct CreateArticleInput {
    pub title: String,
    pub content: String,
    pub status: ArticleStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateArticleError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),

    /// 記事は作成済みだが検索エンジンへの反映に失敗した。
    /// 同じ記事を再度書き込めば冪等に回復できる。
    #[error("article {article_id} was created but could not be indexed: {source}")]
    Indexing {
        article_id: i64,
        #[source]
        source: SearchGatewayError,
    },
}

/// CreateArticleUseCase は記事を作成し、エイリアス経由で検索エンジンへ反映する。
pub struct CreateArticleUseCase {
    article_repo: Arc<dyn ArticleRepository>,
    gateway: Arc<dyn SearchGateway>,
    alias: String,
}

impl CreateArticleUseCase {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        gateway: Arc<dyn SearchGateway>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            article_repo,
            gateway,
            alias: alias.into(),
        }
    }

    pub async fn execute(
        &self,
        principal: &Principal,
        input: &CreateArticleInput,
    ) -> Result<Article, CreateArticleError> {
        let title = normalize_title(&input.title)
            .map_err(|e| CreateArticleError::Validation(e.to_string()))?;

        let article = Article::new(
            principal.user_id,
            title,
            input.content.clone(),
            input.status,
        );
        let created = self
            .article_repo
            .create(&article)
            .await
            .map_err(|e| CreateArticleError::Internal(e.to_string()))?;

        let doc = document_mapper::to_document(&created);
        if let Err(source) = self.gateway.write_document(&self.alias, &doc).await {
            warn!(article_id = created.id, error = %source, "article created but not indexed");
            return Err(CreateArticleError::Indexing {
                article_id: created.id,
                source,
            });
        }

        info!(article_id = created.id, user = %principal.uid, "article created");
        Ok(created)
    }
}
