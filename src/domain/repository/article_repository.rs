use async_trait::async_trait;

use crate::domain::entity::article::Article;

/// ArticleRepository は記録系（記事の正本）へのアクセスを表すリポジトリトレイト。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// IDで記事を検索する。
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Article>>;

    /// ID 昇順で1ページ分の記事を取得する。page は1始まり。
    /// ページが尽きると空の Vec を返し、これが走査終了の唯一の合図となる。
    async fn list(&self, page: u32, page_size: u32) -> anyhow::Result<Vec<Article>>;

    /// 記事を作成し、採番済みの記事を返す。
    async fn create(&self, article: &Article) -> anyhow::Result<Article>;

    /// 記事を保存する。対象が存在しない場合は None を返す。
    async fn update(&self, article: &Article) -> anyhow::Result<Option<Article>>;

    /// 記事を削除する。対象が存在しない場合は false を返す。
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}
