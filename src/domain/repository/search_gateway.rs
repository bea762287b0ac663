use async_trait::async_trait;

use crate::domain::entity::article::Article;
use crate::domain::entity::article_document::{ArticleDocument, ArticleQuery};
use crate::domain::entity::index_generation::IndexSchema;
use crate::domain::error::SearchGatewayError;

pub type GatewayResult<T> = Result<T, SearchGatewayError>;

/// SearchGateway は検索エンジンの管理 API・データ API をまとめたゲートウェイ。
///
/// `target` 引数には世代インデックス名とエイリアス名のどちらも指定できる。
/// 実装は内部でリトライしない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// インデックスを作成する。同名インデックスが既に存在する場合は成功扱い。
    async fn create_index(&self, name: &str, schema: &IndexSchema) -> GatewayResult<()>;

    async fn delete_index(&self, name: &str) -> GatewayResult<()>;

    /// 書き込み済みドキュメントを検索可能にする。
    async fn refresh_index(&self, name: &str) -> GatewayResult<()>;

    /// ドキュメントを1件 upsert する。ドキュメント ID は `doc.id`。
    async fn write_document(&self, target: &str, doc: &ArticleDocument) -> GatewayResult<()>;

    /// ドキュメントを一括 upsert する。
    /// 1件でも失敗した操作があれば、全失敗項目を列挙した
    /// `SearchGatewayError::PartialBulkFailure` を返す。
    async fn bulk_write(&self, index: &str, docs: &[ArticleDocument]) -> GatewayResult<()>;

    async fn delete_document(&self, target: &str, id: &str) -> GatewayResult<()>;

    /// エイリアスを new_index に張り替え、張り替え前の付与先インデックス名を返す。
    /// 既存の付与先からの削除と new_index への付与は1リクエストで行う。
    /// エイリアスが未作成の場合は単純な付与になる（発見と付与はアトミックではない）。
    async fn repoint_alias(&self, alias: &str, new_index: &str) -> GatewayResult<Vec<String>>;

    /// エイリアスが現在付与されているインデックス名の一覧。未作成なら空。
    async fn alias_targets(&self, alias: &str) -> GatewayResult<Vec<String>>;

    /// パターン（末尾 `*` のワイルドカード）に一致するインデックス名の一覧。
    async fn list_indices(&self, pattern: &str) -> GatewayResult<Vec<String>>;

    /// 検索を実行し、ヒットを記事に変換して返す。変換できないヒットは読み飛ばす。
    async fn search(&self, target: &str, query: &ArticleQuery) -> GatewayResult<Vec<Article>>;
}
