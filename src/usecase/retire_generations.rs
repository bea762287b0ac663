use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entity::index_generation::is_generation_index;
use crate::domain::error::SearchGatewayError;
use crate::domain::repository::SearchGateway;

#[derive(Debug, Clone)]
pub struct RetireGenerationsInput {
    pub alias: String,
    pub index_prefix: String,
    /// エイリアスに付与されていない世代のうち、新しい順に残す数。
    pub keep: usize,
}

/// RetireReport は世代インデックス回収の結果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetireReport {
    /// エイリアスが付与されているため対象外とした世代。
    pub live: Vec<String>,
    pub kept: Vec<String>,
    pub deleted: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RetireGenerationsError {
    #[error("世代インデックスの一覧取得に失敗しました: {0}")]
    Discovery(#[source] SearchGatewayError),

    #[error("一部の世代インデックスを削除できませんでした: {failed:?}")]
    PartialFailure {
        report: RetireReport,
        failed: Vec<String>,
    },
}

/// RetireGenerationsUseCase はエイリアスから外れた古い世代インデックスを削除する。
/// 再構築ユースケースは旧世代を自動削除しないため、運用者が明示的に実行する。
pub struct RetireGenerationsUseCase {
    gateway: Arc<dyn SearchGateway>,
}

impl RetireGenerationsUseCase {
    pub fn new(gateway: Arc<dyn SearchGateway>) -> Self {
        Self { gateway }
    }

    pub async fn execute(
        &self,
        input: &RetireGenerationsInput,
    ) -> Result<RetireReport, RetireGenerationsError> {
        let live = self
            .gateway
            .alias_targets(&input.alias)
            .await
            .map_err(RetireGenerationsError::Discovery)?;

        let pattern = format!("{}*", input.index_prefix);
        let mut candidates: Vec<String> = self
            .gateway
            .list_indices(&pattern)
            .await
            .map_err(RetireGenerationsError::Discovery)?
            .into_iter()
            .filter(|name| is_generation_index(&input.index_prefix, name))
            .filter(|name| !live.contains(name))
            .collect();

        // 名前のタイムスタンプ部で新しい順に並べる
        candidates.sort_unstable_by(|a, b| b.cmp(a));
        let deletable = candidates.split_off(input.keep.min(candidates.len()));

        let mut report = RetireReport {
            live,
            kept: candidates,
            deleted: Vec::new(),
        };
        let mut failed = Vec::new();

        for name in deletable {
            match self.gateway.delete_index(&name).await {
                Ok(()) => {
                    info!(index = %name, "retired generation index");
                    report.deleted.push(name);
                }
                Err(e) => {
                    warn!(index = %name, error = %e, "failed to retire generation index");
                    failed.push(name);
                }
            }
        }

        if failed.is_empty() {
            Ok(report)
        } else {
            Err(RetireGenerationsError::PartialFailure { report, failed })
        }
    }
}
