use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User は記事の作成者となるユーザー。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub uid: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 未採番のユーザーを作成する。
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            id: 0,
            uid: uid.into(),
            created_at: Utc::now(),
        }
    }
}

/// Principal は認証済みの操作主体。
/// 書き込み系ユースケースには呼び出し元が明示的に渡す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub uid: String,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            uid: user.uid.clone(),
        }
    }
}
