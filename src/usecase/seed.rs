use std::sync::Arc;

use tracing::info;

use crate::domain::entity::article::{Article, ArticleStatus};
use crate::domain::entity::user::User;
use crate::domain::repository::{ArticleRepository, UserRepository};
use crate::usecase::reindex_search_engine::{
    ReindexError, ReindexReport, ReindexSearchEngineUseCase,
};

/// 初期投入するユーザーの UID。
pub const SEED_USER_UIDS: [&str; 2] = ["admin123", "admin456"];

/// SeedReport はシード投入の結果。
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub users: Vec<User>,
    pub articles: Vec<Article>,
    pub reindex: ReindexReport,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("シード投入用のユーザーが存在しません")]
    NoSeedUsers,

    #[error("シード投入用の記事が存在しません")]
    NoSeedArticles,

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Reindex(#[from] ReindexError),
}

/// SeedUseCase は初期ユーザーと初期記事を投入し、最後に検索インデックスを一度再構築する。
pub struct SeedUseCase {
    user_repo: Arc<dyn UserRepository>,
    article_repo: Arc<dyn ArticleRepository>,
    reindex: ReindexSearchEngineUseCase,
}

impl SeedUseCase {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        article_repo: Arc<dyn ArticleRepository>,
        reindex: ReindexSearchEngineUseCase,
    ) -> Self {
        Self {
            user_repo,
            article_repo,
            reindex,
        }
    }

    pub async fn execute(&self) -> Result<SeedReport, SeedError> {
        let users = self.seed_users().await?;
        info!(count = users.len(), "seeded users");
        let owner = users.first().ok_or(SeedError::NoSeedUsers)?;

        let articles = self.seed_articles(owner.id).await?;
        if articles.is_empty() {
            return Err(SeedError::NoSeedArticles);
        }
        info!(count = articles.len(), owner = %owner.uid, "seeded articles");

        let reindex = self.reindex.execute().await?;
        Ok(SeedReport {
            users,
            articles,
            reindex,
        })
    }

    /// 既存ユーザーはそのまま使い、見つからない UID だけを作成する。
    async fn seed_users(&self) -> Result<Vec<User>, SeedError> {
        let mut users = Vec::with_capacity(SEED_USER_UIDS.len());
        for uid in SEED_USER_UIDS {
            let existing = self
                .user_repo
                .find_by_uid(uid)
                .await
                .map_err(|e| SeedError::Internal(e.to_string()))?;
            let user = match existing {
                Some(user) => user,
                None => self
                    .user_repo
                    .create(&User::new(uid.to_string()))
                    .await
                    .map_err(|e| SeedError::Internal(e.to_string()))?,
            };
            users.push(user);
        }
        Ok(users)
    }

    async fn seed_articles(&self, owner_id: i64) -> Result<Vec<Article>, SeedError> {
        let mut articles = Vec::new();
        for article in baseline_articles(owner_id) {
            let created = self
                .article_repo
                .create(&article)
                .await
                .map_err(|e| SeedError::Internal(e.to_string()))?;
            articles.push(created);
        }
        Ok(articles)
    }
}

fn baseline_articles(owner_id: i64) -> Vec<Article> {
    vec![
        Article::new(
            owner_id,
            "My first article".to_string(),
            "Elasticsearch 互換エンジンで全文検索を試す最初の記事です。".to_string(),
            ArticleStatus::Published,
        ),
        Article::new(
            owner_id,
            "下書きメモ".to_string(),
            "first draft: まだ公開していない記事です。".to_string(),
            ArticleStatus::Draft,
        ),
    ]
}
