use async_trait::async_trait;

use crate::domain::entity::user::User;

/// UserRepository はユーザー永続化のためのリポジトリトレイト。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;

    async fn find_by_uid(&self, uid: &str) -> anyhow::Result<Option<User>>;

    /// ユーザーを作成し、採番済みのユーザーを返す。
    async fn create(&self, user: &User) -> anyhow::Result<User>;
}
