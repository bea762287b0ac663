use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entity::user::Principal;
use crate::domain::error::SearchGatewayError;
use crate::domain::repository::{ArticleRepository, SearchGateway};

#[derive(Debug, thiserror::Error)]
pub enum DeleteArticleError {
    #[error("article not found: {0}")]
    NotFound(i64),

    #[error("internal error: {0}")]
    Internal(String),

    /// 記事は削除済みだが検索エンジン上のドキュメントが残っている。
    /// 次回の再構築で解消される。
    #[error("article {article_id} was deleted but its document remains indexed: {source}")]
    Indexing {
        article_id: i64,
        #[source]
        source: SearchGatewayError,
    },
}

/// DeleteArticleUseCase は記録系から記事を削除し、続けてエイリアスからドキュメントを削除する。
pub struct DeleteArticleUseCase {
    article_repo: Arc<dyn ArticleRepository>,
    gateway: Arc<dyn SearchGateway>,
    alias: String,
}

impl DeleteArticleUseCase {
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

    pub async fn execute(&self, principal: &Principal, id: i64) -> Result<(), DeleteArticleError> {
        let deleted = self
            .article_repo
            .delete(id)
            .await
            .map_err(|e| DeleteArticleError::Internal(e.to_string()))?;

        if !deleted {
            return Err(DeleteArticleError::NotFound(id));
        }

        if let Err(source) = self
            .gateway
            .delete_document(&self.alias, &id.to_string())
            .await
        {
            warn!(article_id = id, error = %source, "article deleted but document remains indexed");
            return Err(DeleteArticleError::Indexing {
                article_id: id,
                source,
            });
        }

        info!(article_id = id, user = %principal.uid, "article deleted");
        Ok(())
    }
}
