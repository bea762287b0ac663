use thiserror::Error;

/// BulkItemFailure は一括書き込みで失敗した1操作の内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// 操作種別（index, create, delete など）。
    pub operation: String,
    pub document_id: String,
    pub status: u16,
    pub reason: String,
}

impl std::fmt::Display for BulkItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Operation: {}, Id: {}, Status: {}, Error: {}",
            self.operation, self.document_id, self.status, self.reason
        )
    }
}

fn format_failures(failures: &[BulkItemFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// SearchGatewayError は検索エンジン操作のエラー。
/// ゲートウェイ自身はリトライしない。リトライ可否は `is_transient` で判断する。
#[derive(Debug, Error)]
pub enum SearchGatewayError {
    /// 通信エラーやエンジンの一時的な不可用。失敗したフェーズごと再実行してよい。
    #[error("検索エンジンに一時的に接続できません: {0}")]
    Transient(String),

    /// 一括書き込みは受理されたが、1件以上の操作が失敗した。
    #[error("一括書き込みでエラーが発生しました (index: {index}, {} 件):\n{}", .failures.len(), format_failures(.failures))]
    PartialBulkFailure {
        index: String,
        failures: Vec<BulkItemFailure>,
    },

    /// 同名インデックスが互換性のないマッピングで存在する。
    #[error("インデックスのスキーマが競合しています (index: {index}): {reason}")]
    SchemaConflict { index: String, reason: String },

    /// エンジンがリクエストを拒否した（4xx 系）。
    #[error("検索エンジンがリクエストを拒否しました (status: {status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// レスポンスの解釈に失敗した。
    #[error("検索エンジンのレスポンスを解釈できません: {0}")]
    InvalidResponse(String),

    #[error("ドキュメントをエンコードできません: {0}")]
    Encode(String),
}

impl SearchGatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
