use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::entity::article::{normalize_title, Article, ArticleUpdate};
use crate::domain::entity::user::Principal;
use crate::domain::error::SearchGatewayError;
use crate::domain::repository::{ArticleRepository, SearchGateway};
use crate::domain::service::document_mapper;

#[derive(Debug, Clone)]
pub struct UpdateArticleInput {
    pub id: i64,
    pub update: ArticleUpdate,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateArticleError {
    #[error("article not found: {0}")]
    NotFound(i64),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("article {article_id} was updated but could not be indexed: {source}")]
    Indexing {
        article_id: i64,
        #[source]
        source: SearchGatewayError,
    },
}

/// UpdateArticleUseCase は記事の差分更新を行い、変更があった場合のみ検索エンジンへ反映する。
/// 公開・アーカイブはステータスだけの差分として扱う。
pub struct UpdateArticleUseCase {
    article_repo: Arc<dyn ArticleRepository>,
    gateway: Arc<dyn SearchGateway>,
    alias: String,
}

impl UpdateArticleUseCase {
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
        input: &UpdateArticleInput,
    ) -> Result<Article, UpdateArticleError> {
        let mut update = input.update.clone();
        if let Some(title) = &input.update.title {
            update.title = Some(
                normalize_title(title)
                    .map_err(|e| UpdateArticleError::Validation(e.to_string()))?,
            );
        }

        let mut article = self
            .article_repo
            .find_by_id(input.id)
            .await
            .map_err(|e| UpdateArticleError::Internal(e.to_string()))?
            .ok_or(UpdateArticleError::NotFound(input.id))?;

        if !update.apply(&mut article) {
            debug!(article_id = input.id, "no field changed, skipping update");
            return Ok(article);
        }

        let updated = self
            .article_repo
            .update(&article)
            .await
            .map_err(|e| UpdateArticleError::Internal(e.to_string()))?
            .ok_or(UpdateArticleError::NotFound(input.id))?;

        let doc = document_mapper::to_document(&updated);
        if let Err(source) = self.gateway.write_document(&self.alias, &doc).await {
            warn!(article_id = updated.id, error = %source, "article updated but not indexed");
            return Err(UpdateArticleError::Indexing {
                article_id: updated.id,
                source,
            });
        }

        info!(
            article_id = updated.id,
            status = %updated.status,
            user = %principal.uid,
            "article updated"
        );
        Ok(updated)
    }
}
