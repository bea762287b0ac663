use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::article::{Article, ArticleStatus};
use crate::domain::repository::ArticleRepository;

/// ArticlePostgresRepository は PostgreSQL を記録系とする ArticleRepository 実装。
pub struct ArticlePostgresRepository {
    pool: Arc<PgPool>,
}

impl ArticlePostgresRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

/// ページ番号（1始まり）とページサイズから OFFSET を求める。
fn page_offset(page: u32, page_size: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(page_size)
}

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    user_id: i64,
    title: String,
    content: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ArticleRow> for Article {
    type Error = anyhow::Error;

    fn try_from(r: ArticleRow) -> anyhow::Result<Self> {
        Ok(Article {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            content: r.content,
            status: ArticleStatus::from_str_value(&r.status)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

const ARTICLE_COLUMNS: &str = "id, user_id, title, content, status, created_at, updated_at";

#[async_trait]
impl ArticleRepository for ArticlePostgresRepository {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM articles WHERE id = $1",
            ARTICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.map(Article::try_from).transpose()
    }

    /// 安定したページングのため id 昇順で返す。
    async fn list(&self, page: u32, page_size: u32) -> anyhow::Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(&format!(
            "SELECT {} FROM articles ORDER BY id ASC LIMIT $1 OFFSET $2",
            ARTICLE_COLUMNS
        ))
        .bind(i64::from(page_size))
        .bind(page_offset(page, page_size))
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(Article::try_from).collect()
    }

    async fn create(&self, article: &Article) -> anyhow::Result<Article> {
        let row: ArticleRow = sqlx::query_as(&format!(
            "INSERT INTO articles (user_id, title, content, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            ARTICLE_COLUMNS
        ))
        .bind(article.user_id)
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.status.to_string())
        .bind(article.created_at)
        .bind(article.updated_at)
        .fetch_one(self.pool.as_ref())
        .await?;
        row.try_into()
    }

    async fn update(&self, article: &Article) -> anyhow::Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(&format!(
            "UPDATE articles SET title = $2, content = $3, status = $4, updated_at = $5 \
             WHERE id = $1 \
             RETURNING {}",
            ARTICLE_COLUMNS
        ))
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.content)
        .bind(article.status.to_string())
        .bind(article.updated_at)
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.map(Article::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
