use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::domain::entity::article::Article;
use crate::domain::entity::index_generation::{
    generation_index_name, AnalyzerSettings, IndexSchema, ARTICLE_ALIAS, GENERATION_PREFIX,
};
use crate::domain::error::SearchGatewayError;
use crate::domain::repository::{ArticleRepository, SearchGateway};
use crate::domain::service::document_mapper;
use crate::usecase::retry::{with_retry, RetryConfig};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// ReindexSettings はインデックス再構築の実行パラメータ。
#[derive(Debug, Clone)]
pub struct ReindexSettings {
    pub alias: String,
    pub index_prefix: String,
    pub schema: IndexSchema,
    pub page_size: u32,
    pub timeout: Duration,
    pub prefetch_next_page: bool,
    pub retry: RetryConfig,
}

impl Default for ReindexSettings {
    fn default() -> Self {
        Self {
            alias: ARTICLE_ALIAS.to_string(),
            index_prefix: GENERATION_PREFIX.to_string(),
            schema: IndexSchema::articles(&AnalyzerSettings::default()),
            page_size: 100,
            timeout: Duration::from_secs(600),
            prefetch_next_page: false,
            retry: RetryConfig::default(),
        }
    }
}

/// ReindexReport は完了した再構築の結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexReport {
    /// 新たにエイリアスが付与された世代インデックス名。
    pub generation: String,
    /// 読み出した空でないページ数。
    pub pages: u32,
    pub documents: usize,
    /// 張り替え前にエイリアスが付与されていた世代インデックス。削除はされていない。
    pub previous_generations: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReindexError {
    #[error("世代インデックスの作成に失敗しました (index: {index}): {source}")]
    Allocate {
        index: String,
        #[source]
        source: SearchGatewayError,
    },

    #[error("記事の読み出しに失敗しました (page: {page}): {message}")]
    Load { page: u32, message: String },

    #[error("一括書き込みに失敗しました (index: {index}, page: {page}): {source}")]
    BulkWrite {
        index: String,
        page: u32,
        #[source]
        source: SearchGatewayError,
    },

    #[error("世代インデックスのリフレッシュに失敗しました (index: {index}): {source}")]
    Refresh {
        index: String,
        #[source]
        source: SearchGatewayError,
    },

    #[error("エイリアスの張り替えに失敗しました (alias: {alias}, index: {index}): {source}")]
    Cutover {
        alias: String,
        index: String,
        #[source]
        source: SearchGatewayError,
    },

    /// 同じ分に既に公開済みの世代がある。稼働中のインデックスには書き込まない。
    #[error("世代インデックス {index} は既にエイリアス {alias} に付与されています。次の分以降に再実行してください")]
    GenerationInUse { alias: String, index: String },

    #[error("再構築が制限時間 ({0:?}) を超えました")]
    DeadlineExceeded(Duration),
}

/// ReindexSearchEngineUseCase は記録系から検索インデックスを無停止で再構築する。
///
/// 1. 世代インデックスを作成する
/// 2. 記録系を1ページずつ読み出し、ページ単位で世代インデックスへ一括書き込みする
/// 3. 世代インデックスをリフレッシュする
/// 4. エイリアスを世代インデックスへ張り替える
///
/// いずれかのフェーズが失敗した時点で中断し、エイリアスには触れない。
/// 途中まで書き込まれた世代インデックスは削除しない（RetireGenerationsUseCase で回収する）。
pub struct ReindexSearchEngineUseCase {
    article_repo: Arc<dyn ArticleRepository>,
    gateway: Arc<dyn SearchGateway>,
    settings: ReindexSettings,
    clock: Clock,
}

impl ReindexSearchEngineUseCase {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        gateway: Arc<dyn SearchGateway>,
        settings: ReindexSettings,
    ) -> Self {
        Self {
            article_repo,
            gateway,
            settings,
            clock: Arc::new(Utc::now),
        }
    }

    /// 世代インデックス名の生成に使う時刻の取得元を差し替える。
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &ReindexSettings {
        &self.settings
    }

    /// 制限時間付きで再構築を実行する。
    /// 制限時間を超えた場合は途中で打ち切り、次回はフェーズ1からやり直しになる。
    pub async fn execute(&self) -> Result<ReindexReport, ReindexError> {
        let timeout = self.settings.timeout;
        if let Ok(result) = tokio::time::timeout(timeout, self.run()).await {
            result
        } else {
            error!(timeout_secs = timeout.as_secs(), "reindex deadline exceeded, alias left untouched");
            Err(ReindexError::DeadlineExceeded(timeout))
        }
    }

    async fn run(&self) -> Result<ReindexReport, ReindexError> {
        let generation = generation_index_name(&self.settings.index_prefix, (self.clock)());
        let retry = &self.settings.retry;

        info!(generation = %generation, "allocating generation index");
        self.allocate(&generation).await?;

        info!(
            generation = %generation,
            page_size = self.settings.page_size,
            prefetch = self.settings.prefetch_next_page,
            "loading articles into generation index"
        );
        let (pages, documents) = self.drain_and_load(&generation).await?;

        with_retry(retry, "refresh", || self.gateway.refresh_index(&generation))
            .await
            .map_err(|source| ReindexError::Refresh {
                index: generation.clone(),
                source,
            })?;

        info!(
            generation = %generation,
            alias = %self.settings.alias,
            pages,
            documents,
            "switching alias to generation index"
        );
        let previous = with_retry(retry, "cutover", || {
            self.gateway.repoint_alias(&self.settings.alias, &generation)
        })
        .await
        .map_err(|source| ReindexError::Cutover {
            alias: self.settings.alias.clone(),
            index: generation.clone(),
            source,
        })?;

        let previous_generations: Vec<String> =
            previous.into_iter().filter(|name| *name != generation).collect();

        info!(
            generation = %generation,
            previous = ?previous_generations,
            "reindex completed"
        );

        Ok(ReindexReport {
            generation,
            pages,
            documents,
            previous_generations,
        })
    }

    /// 空の世代インデックスを用意する。
    /// エイリアスが付与されている名前には触れずに中断する。以前の実行が残した
    /// 未公開の同名インデックスは削除してから作り直す。
    async fn allocate(&self, generation: &str) -> Result<(), ReindexError> {
        let retry = &self.settings.retry;
        let allocate_error = |source: SearchGatewayError| ReindexError::Allocate {
            index: generation.to_string(),
            source,
        };

        let live = with_retry(retry, "allocate", || {
            self.gateway.alias_targets(&self.settings.alias)
        })
        .await
        .map_err(allocate_error)?;
        if live.iter().any(|name| name == generation) {
            error!(generation, alias = %self.settings.alias, "generation name is already live");
            return Err(ReindexError::GenerationInUse {
                alias: self.settings.alias.clone(),
                index: generation.to_string(),
            });
        }

        let pattern = format!("{}*", self.settings.index_prefix);
        let existing = with_retry(retry, "allocate", || self.gateway.list_indices(&pattern))
            .await
            .map_err(allocate_error)?;
        if existing.iter().any(|name| name == generation) {
            warn!(generation, "discarding unpublished generation left by an earlier run");
            with_retry(retry, "allocate", || self.gateway.delete_index(generation))
                .await
                .map_err(allocate_error)?;
        }

        with_retry(retry, "allocate", || {
            self.gateway.create_index(generation, &self.settings.schema)
        })
        .await
        .map_err(allocate_error)
    }

    /// 記録系をページ 1 から空ページが返るまで走査し、ページ単位で一括書き込みする。
    /// 一括書き込みは常にページ順に1つずつ行う。先読みが有効な場合のみ、
    /// ページ N の書き込みと並行してページ N+1 を読み出す。
    async fn drain_and_load(&self, generation: &str) -> Result<(u32, usize), ReindexError> {
        let mut page = 1;
        let mut documents = 0;
        let mut current = self.fetch_page(page).await?;

        while !current.is_empty() {
            let next = if self.settings.prefetch_next_page {
                let (written, next) = tokio::join!(
                    self.write_page(generation, page, &current),
                    self.fetch_page(page + 1)
                );
                written?;
                next?
            } else {
                self.write_page(generation, page, &current).await?;
                self.fetch_page(page + 1).await?
            };

            documents += current.len();
            debug!(generation, page, documents, "page indexed");
            current = next;
            page += 1;
        }

        Ok((page - 1, documents))
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<Article>, ReindexError> {
        self.article_repo
            .list(page, self.settings.page_size)
            .await
            .map_err(|e| ReindexError::Load {
                page,
                message: e.to_string(),
            })
    }

    async fn write_page(
        &self,
        generation: &str,
        page: u32,
        articles: &[Article],
    ) -> Result<(), ReindexError> {
        let docs: Vec<_> = articles.iter().map(document_mapper::to_document).collect();
        with_retry(&self.settings.retry, "bulk_write", || {
            self.gateway.bulk_write(generation, &docs)
        })
        .await
        .map_err(|source| {
            error!(generation, page, error = %source, "bulk write failed, aborting reindex");
            ReindexError::BulkWrite {
                index: generation.to_string(),
                page,
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::article::ArticleStatus;
    use crate::domain::error::BulkItemFailure;
    use crate::domain::repository::article_repository::MockArticleRepository;
    use crate::domain::repository::search_gateway::MockSearchGateway;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    const GENERATION: &str = "article_202601021504";

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 15, 4, 0).unwrap()
    }

    fn settings() -> ReindexSettings {
        ReindexSettings {
            retry: RetryConfig::new(3).with_initial_delay(Duration::from_millis(1)),
            ..Default::default()
        }
    }

    fn page_of(total: u32, page: u32, page_size: u32) -> Vec<Article> {
        let start = (page - 1) * page_size;
        (start..total.min(start + page_size))
            .map(|i| {
                let mut a = Article::new(
                    1,
                    format!("title-{}", i + 1),
                    "content".to_string(),
                    ArticleStatus::Published,
                );
                a.id = i64::from(i + 1);
                a
            })
            .collect()
    }

    fn store_with(total: u32) -> MockArticleRepository {
        let mut repo = MockArticleRepository::new();
        repo.expect_list()
            .returning(move |page, size| Ok(page_of(total, page, size)));
        repo
    }

    /// 公開済み世代も残骸もない状態のエンジン。
    fn fresh_engine() -> MockSearchGateway {
        let mut gateway = MockSearchGateway::new();
        gateway
            .expect_alias_targets()
            .withf(|alias| alias == "articles")
            .returning(|_| Ok(vec!["article_202512010000".to_string()]));
        gateway
            .expect_list_indices()
            .withf(|pattern| pattern == "article_*")
            .returning(|_| Ok(vec!["article_202512010000".to_string()]));
        gateway
    }

    fn uc(repo: MockArticleRepository, gateway: MockSearchGateway) -> ReindexSearchEngineUseCase {
        ReindexSearchEngineUseCase::new(Arc::new(repo), Arc::new(gateway), settings())
            .with_clock(fixed_clock)
    }

    #[tokio::test]
    async fn success_pages_through_store_and_switches_alias() {
        let mut gateway = fresh_engine();
        gateway
            .expect_create_index()
            .withf(|name, _| name == GENERATION)
            .times(1)
            .returning(|_, _| Ok(()));
        let sizes = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = sizes.clone();
        gateway
            .expect_bulk_write()
            .withf(|index, _| index == GENERATION)
            .times(3)
            .returning(move |_, docs| {
                recorded.lock().unwrap().push(docs.len());
                Ok(())
            });
        gateway
            .expect_refresh_index()
            .withf(|name| name == GENERATION)
            .times(1)
            .returning(|_| Ok(()));
        gateway
            .expect_repoint_alias()
            .withf(|alias, index| alias == "articles" && index == GENERATION)
            .times(1)
            .returning(|_, _| Ok(vec!["article_202512010000".to_string()]));

        let report = uc(store_with(250), gateway).execute().await.unwrap();

        assert_eq!(report.generation, GENERATION);
        assert_eq!(report.pages, 3);
        assert_eq!(report.documents, 250);
        assert_eq!(report.previous_generations, vec!["article_202512010000"]);
        assert_eq!(*sizes.lock().unwrap(), vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn pagination_stops_at_first_empty_page() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut repo = MockArticleRepository::new();
        repo.expect_list().returning(move |page, size| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(page_of(200, page, size))
        });

        let mut gateway = fresh_engine();
        gateway.expect_create_index().returning(|_, _| Ok(()));
        gateway.expect_bulk_write().times(2).returning(|_, _| Ok(()));
        gateway.expect_refresh_index().returning(|_| Ok(()));
        gateway.expect_repoint_alias().returning(|_, _| Ok(vec![]));

        let report = uc(repo, gateway).execute().await.unwrap();
        assert_eq!(report.pages, 2);
        // ceil(200/100) = 2 回の非空ページ + 1 回の空ページ
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_store_still_switches_alias_to_empty_generation() {
        let mut gateway = fresh_engine();
        gateway.expect_create_index().times(1).returning(|_, _| Ok(()));
        gateway.expect_bulk_write().never();
        gateway.expect_refresh_index().times(1).returning(|_| Ok(()));
        gateway.expect_repoint_alias().times(1).returning(|_, _| Ok(vec![]));

        let report = uc(store_with(0), gateway).execute().await.unwrap();
        assert_eq!(report.pages, 0);
        assert_eq!(report.documents, 0);
        assert!(report.previous_generations.is_empty());
    }

    #[tokio::test]
    async fn bulk_failure_aborts_before_cutover() {
        let mut gateway = fresh_engine();
        gateway.expect_create_index().returning(|_, _| Ok(()));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        gateway.expect_bulk_write().returning(move |index, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                Err(SearchGatewayError::PartialBulkFailure {
                    index: index.to_string(),
                    failures: vec![BulkItemFailure {
                        operation: "index".to_string(),
                        document_id: "150".to_string(),
                        status: 400,
                        reason: "mapper_parsing_exception".to_string(),
                    }],
                })
            } else {
                Ok(())
            }
        });
        gateway.expect_refresh_index().never();
        gateway.expect_repoint_alias().never();

        let err = uc(store_with(250), gateway).execute().await.unwrap_err();
        match err {
            ReindexError::BulkWrite { index, page, source } => {
                assert_eq!(index, GENERATION);
                assert_eq!(page, 2);
                assert!(matches!(source, SearchGatewayError::PartialBulkFailure { .. }));
            }
            e => unreachable!("unexpected error: {:?}", e),
        }
        // 部分失敗はリトライしない
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transient_bulk_error_is_retried() {
        let mut gateway = fresh_engine();
        gateway.expect_create_index().returning(|_, _| Ok(()));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        gateway.expect_bulk_write().returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SearchGatewayError::Transient("connection reset".to_string()))
            } else {
                Ok(())
            }
        });
        gateway.expect_refresh_index().returning(|_| Ok(()));
        gateway.expect_repoint_alias().times(1).returning(|_, _| Ok(vec![]));

        let report = uc(store_with(50), gateway).execute().await.unwrap();
        assert_eq!(report.documents, 50);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn allocate_failure_reads_nothing() {
        let mut repo = MockArticleRepository::new();
        repo.expect_list().never();
        let mut gateway = fresh_engine();
        gateway.expect_create_index().returning(|name, _| {
            Err(SearchGatewayError::SchemaConflict {
                index: name.to_string(),
                reason: "mapper_exception".to_string(),
            })
        });
        gateway.expect_repoint_alias().never();

        let err = uc(repo, gateway).execute().await.unwrap_err();
        assert!(matches!(err, ReindexError::Allocate { .. }));
    }

    #[tokio::test]
    async fn store_failure_aborts_before_cutover() {
        let mut repo = MockArticleRepository::new();
        repo.expect_list()
            .returning(|page, size| {
                if page == 2 {
                    Err(anyhow::anyhow!("connection closed"))
                } else {
                    Ok(page_of(250, page, size))
                }
            });
        let mut gateway = fresh_engine();
        gateway.expect_create_index().returning(|_, _| Ok(()));
        gateway.expect_bulk_write().times(1).returning(|_, _| Ok(()));
        gateway.expect_repoint_alias().never();

        let err = uc(repo, gateway).execute().await.unwrap_err();
        match err {
            ReindexError::Load { page, message } => {
                assert_eq!(page, 2);
                assert!(message.contains("connection closed"));
            }
            e => unreachable!("unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn cutover_failure_is_reported() {
        let mut gateway = fresh_engine();
        gateway.expect_create_index().returning(|_, _| Ok(()));
        gateway.expect_bulk_write().returning(|_, _| Ok(()));
        gateway.expect_refresh_index().returning(|_| Ok(()));
        gateway.expect_repoint_alias().times(1).returning(|_, _| {
            Err(SearchGatewayError::Rejected {
                status: 400,
                reason: "invalid_alias_name_exception".to_string(),
            })
        });

        let err = uc(store_with(10), gateway).execute().await.unwrap_err();
        assert!(matches!(err, ReindexError::Cutover { .. }));
    }

    #[tokio::test]
    async fn prefetch_keeps_page_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = order.clone();
        let mut gateway = fresh_engine();
        gateway.expect_create_index().returning(|_, _| Ok(()));
        gateway.expect_bulk_write().returning(move |_, docs| {
            recorded.lock().unwrap().push(docs[0].id.clone());
            Ok(())
        });
        gateway.expect_refresh_index().returning(|_| Ok(()));
        gateway.expect_repoint_alias().returning(|_, _| Ok(vec![]));

        let settings = ReindexSettings {
            page_size: 10,
            prefetch_next_page: true,
            ..settings()
        };
        let uc = ReindexSearchEngineUseCase::new(
            Arc::new(store_with(35)),
            Arc::new(gateway),
            settings,
        )
        .with_clock(fixed_clock);

        let report = uc.execute().await.unwrap();
        assert_eq!(report.pages, 4);
        assert_eq!(report.documents, 35);
        assert_eq!(*order.lock().unwrap(), vec!["1", "11", "21", "31"]);
    }

    #[tokio::test]
    async fn same_minute_as_live_generation_is_refused() {
        let mut repo = MockArticleRepository::new();
        repo.expect_list().never();
        let mut gateway = MockSearchGateway::new();
        gateway
            .expect_alias_targets()
            .returning(|_| Ok(vec![GENERATION.to_string()]));
        gateway.expect_list_indices().never();
        gateway.expect_delete_index().never();
        gateway.expect_create_index().never();
        gateway.expect_bulk_write().never();
        gateway.expect_repoint_alias().never();

        let err = uc(repo, gateway).execute().await.unwrap_err();
        match err {
            ReindexError::GenerationInUse { alias, index } => {
                assert_eq!(alias, "articles");
                assert_eq!(index, GENERATION);
            }
            e => unreachable!("unexpected error: {:?}", e),
        }
    }

    #[tokio::test]
    async fn leftover_generation_is_recreated_before_loading() {
        let steps = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut gateway = MockSearchGateway::new();
        gateway.expect_alias_targets().returning(|_| Ok(vec![]));
        gateway
            .expect_list_indices()
            .returning(|_| Ok(vec![GENERATION.to_string()]));
        let recorded = steps.clone();
        gateway
            .expect_delete_index()
            .withf(|name| name == GENERATION)
            .times(1)
            .returning(move |_| {
                recorded.lock().unwrap().push("delete");
                Ok(())
            });
        let recorded = steps.clone();
        gateway
            .expect_create_index()
            .withf(|name, _| name == GENERATION)
            .times(1)
            .returning(move |_, _| {
                recorded.lock().unwrap().push("create");
                Ok(())
            });
        let recorded = steps.clone();
        gateway.expect_bulk_write().returning(move |_, _| {
            recorded.lock().unwrap().push("bulk");
            Ok(())
        });
        gateway.expect_refresh_index().returning(|_| Ok(()));
        gateway.expect_repoint_alias().returning(|_, _| Ok(vec![]));

        let report = uc(store_with(5), gateway).execute().await.unwrap();
        assert_eq!(report.documents, 5);
        assert_eq!(*steps.lock().unwrap(), vec!["delete", "create", "bulk"]);
    }

    #[tokio::test]
    async fn alias_discovery_failure_is_an_allocate_error() {
        let mut repo = MockArticleRepository::new();
        repo.expect_list().never();
        let mut gateway = MockSearchGateway::new();
        gateway
            .expect_alias_targets()
            .returning(|_| {
                Err(SearchGatewayError::Rejected {
                    status: 403,
                    reason: "forbidden".to_string(),
                })
            });
        gateway.expect_create_index().never();

        let err = uc(repo, gateway).execute().await.unwrap_err();
        assert!(matches!(err, ReindexError::Allocate { .. }));
    }
}
