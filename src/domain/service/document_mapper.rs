//! 記事エンティティと検索ドキュメントの相互変換。
//! 副作用を持たない純粋関数のみで構成する。

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::entity::article::Article;
use crate::domain::entity::article_document::ArticleDocument;

/// 記事をドキュメントに変換する。ドキュメント ID は記事 ID の10進文字列。
pub fn to_document(article: &Article) -> ArticleDocument {
    ArticleDocument {
        id: article.id.to_string(),
        title: article.title.clone(),
        content: article.content.clone(),
        status: article.status,
        created_at: format_timestamp(article.created_at),
        updated_at: format_timestamp(article.updated_at),
    }
}

/// ドキュメントを記事に変換する。
/// タイムスタンプが解釈できない場合は Unix エポックとして扱い、エラーにはしない。
/// id が数値でない場合のみエラーを返す。検索エンジン上のドキュメントは作成者を持たないため
/// user_id は 0 になる。
pub fn to_article(doc: ArticleDocument) -> anyhow::Result<Article> {
    let id: i64 = doc
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid document id {:?}: {}", doc.id, e))?;

    Ok(Article {
        id,
        user_id: 0,
        title: doc.title,
        content: doc.content,
        status: doc.status,
        created_at: parse_timestamp(&doc.created_at),
        updated_at: parse_timestamp(&doc.updated_at),
    })
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::article::ArticleStatus;
    use chrono::TimeZone;

    fn article(id: i64, status: ArticleStatus) -> Article {
        Article {
            id,
            user_id: 3,
            title: "検索エンジン入門".to_string(),
            content: "エイリアスの張り替えについて".to_string(),
            status,
            created_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            updated_at: Utc.timestamp_opt(1_767_323_045, 987_000_000).unwrap(),
        }
    }

    #[test]
    fn test_document_id_equals_article_id() {
        let doc = to_document(&article(1234, ArticleStatus::Draft));
        assert_eq!(doc.id, "1234");
    }

    #[test]
    fn test_timestamps_are_rfc3339_utc() {
        let doc = to_document(&article(1, ArticleStatus::Draft));
        assert_eq!(doc.created_at, "2026-01-02T03:04:05Z");
        assert!(doc.updated_at.ends_with('Z'));
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        for status in [
            ArticleStatus::Draft,
            ArticleStatus::Published,
            ArticleStatus::Archived,
        ] {
            let original = article(77, status);
            let restored = to_article(to_document(&original)).unwrap();
            assert_eq!(restored.id, original.id);
            assert_eq!(restored.title, original.title);
            assert_eq!(restored.content, original.content);
            assert_eq!(restored.status, original.status);
            assert_eq!(restored.created_at, original.created_at);
            // 秒精度で保存するため、サブ秒は切り捨てられる
            assert_eq!(
                restored.updated_at.timestamp(),
                original.updated_at.timestamp()
            );
        }
    }

    #[test]
    fn test_unparsable_timestamp_defaults_to_epoch() {
        let mut doc = to_document(&article(5, ArticleStatus::Published));
        doc.created_at = "2026-01-02 03:04:05 +0000 UTC".to_string();
        doc.updated_at = String::new();
        let restored = to_article(doc).unwrap();
        assert_eq!(restored.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(restored.updated_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(restored.id, 5);
    }

    #[test]
    fn test_offset_timestamp_is_normalized_to_utc() {
        let mut doc = to_document(&article(5, ArticleStatus::Published));
        doc.created_at = "2026-01-02T12:04:05+09:00".to_string();
        let restored = to_article(doc).unwrap();
        assert_eq!(
            restored.created_at,
            Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        let mut doc = to_document(&article(5, ArticleStatus::Published));
        doc.id = "abc".to_string();
        assert!(to_article(doc).is_err());
    }
}
