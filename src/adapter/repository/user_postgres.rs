use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;

/// UserPostgresRepository は PostgreSQL を使った UserRepository 実装。
pub struct UserPostgresRepository {
    pool: Arc<PgPool>,
}

impl UserPostgresRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    uid: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            uid: r.uid,
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for UserPostgresRepository {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, uid, created_at FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_uid(&self, uid: &str) -> anyhow::Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, uid, created_at FROM users WHERE uid = $1")
                .bind(uid)
                .fetch_optional(self.pool.as_ref())
                .await?;
        Ok(row.map(Into::into))
    }

    async fn create(&self, user: &User) -> anyhow::Result<User> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (uid, created_at) VALUES ($1, $2) \
             RETURNING id, uid, created_at",
        )
        .bind(&user.uid)
        .bind(user.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(row.into())
    }
}
