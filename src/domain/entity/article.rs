use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 記事タイトルの最大文字数（articles.title VARCHAR(255) に対応）。
pub const MAX_TITLE_LEN: usize = 255;

/// TitleError はタイトル入力の検証エラー。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TitleError {
    #[error("title must not be empty")]
    Empty,

    #[error("title must be at most {max} characters")]
    TooLong { max: usize },
}

/// 前後の空白を除いたタイトルを返す。作成と更新で同じ規則を使う。
pub fn normalize_title(title: &str) -> Result<String, TitleError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TitleError::Empty);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(TitleError::TooLong { max: MAX_TITLE_LEN });
    }
    Ok(title.to_string())
}

/// ArticleStatus は記事の公開状態を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

impl ArticleStatus {
    /// 永続化・検索エンジン上の文字列表現から変換する。大文字小文字は区別しない。
    pub fn from_str_value(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => anyhow::bail!("invalid article status: {}", s),
        }
    }
}

/// Article は記録系（PostgreSQL）が所有する記事エンティティ。
/// 検索エンジン側はこの派生コピーを結果整合で保持するだけである。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub status: ArticleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// 未採番の記事を作成する。id は記録系への作成時に採番される。
    pub fn new(user_id: i64, title: String, content: String, status: ArticleStatus) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            title,
            content,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }
}

/// ArticleUpdate は記事更新の差分を表す。None のフィールドは変更しない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ArticleStatus>,
}

impl ArticleUpdate {
    /// ステータスのみを変更する差分（公開・アーカイブ操作）。
    pub fn status(status: ArticleStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.status.is_none()
    }

    /// 差分を記事に適用し、実際に値が変わったフィールドがあれば true を返す。
    /// 現在値と同じ値の指定は変更として数えない。
    pub fn apply(&self, article: &mut Article) -> bool {
        let mut changed = false;

        if let Some(ref title) = self.title {
            if *title != article.title {
                article.title = title.clone();
                changed = true;
            }
        }
        if let Some(ref content) = self.content {
            if *content != article.content {
                article.content = content.clone();
                changed = true;
            }
        }
        if let Some(status) = self.status {
            if status != article.status {
                article.status = status;
                changed = true;
            }
        }

        if changed {
            article.updated_at = Utc::now();
        }
        changed
    }
}
