use serde::{Deserialize, Serialize};

use super::article::ArticleStatus;

/// ArticleDocument は検索エンジンに保存する記事ドキュメント。
/// id は記事 ID の10進文字列で、ドキュメント ID と常に一致する。
/// タイムスタンプは RFC 3339 (UTC) 文字列で保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub status: ArticleStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// ArticleQuery はキーワード検索の条件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    pub keyword: String,
    /// Some の場合はステータスで絞り込む。
    pub status: Option<ArticleStatus>,
    pub size: u32,
}

impl ArticleQuery {
    /// 公開済み記事だけを対象にしたキーワード検索。
    pub fn published(keyword: impl Into<String>, size: u32) -> Self {
        Self {
            keyword: keyword.into(),
            status: Some(ArticleStatus::Published),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_wire_format() {
        let doc = ArticleDocument {
            id: "42".to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            status: ArticleStatus::Published,
            created_at: "2026-01-02T03:04:05Z".to_string(),
            updated_at: "2026-01-02T03:04:05Z".to_string(),
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["status"], "published");
        assert_eq!(value["created_at"], "2026-01-02T03:04:05Z");
    }

    #[test]
    fn test_published_query() {
        let q = ArticleQuery::published("rust", 20);
        assert_eq!(q.status, Some(ArticleStatus::Published));
        assert_eq!(q.size, 20);
    }
}
