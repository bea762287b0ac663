use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entity::article::Article;
use crate::domain::entity::article_document::{ArticleDocument, ArticleQuery};
use crate::domain::entity::index_generation::IndexSchema;
use crate::domain::error::{BulkItemFailure, SearchGatewayError};
use crate::domain::repository::search_gateway::GatewayResult;
use crate::domain::repository::SearchGateway;

/// FaultInjectingGateway は別のゲートウェイを包み、書き込み系の呼び出し回数を数える。
/// 指定した回の一括書き込みを部分失敗させることもできる。
pub struct FaultInjectingGateway {
    inner: Arc<dyn SearchGateway>,
    /// 1始まり。この回の bulk_write を PartialBulkFailure にする。
    fail_bulk_on_call: Option<usize>,
    writes: AtomicUsize,
    bulk_calls: AtomicUsize,
    deletes: AtomicUsize,
    repoints: AtomicUsize,
}

impl FaultInjectingGateway {
    pub fn new(inner: Arc<dyn SearchGateway>) -> Self {
        Self {
            inner,
            fail_bulk_on_call: None,
            writes: AtomicUsize::new(0),
            bulk_calls: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            repoints: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn fail_bulk_on_call(mut self, call: usize) -> Self {
        self.fail_bulk_on_call = Some(call);
        self
    }

    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn repoint_calls(&self) -> usize {
        self.repoints.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchGateway for FaultInjectingGateway {
    async fn create_index(&self, name: &str, schema: &IndexSchema) -> GatewayResult<()> {
        self.inner.create_index(name, schema).await
    }

    async fn delete_index(&self, name: &str) -> GatewayResult<()> {
        self.inner.delete_index(name).await
    }

    async fn refresh_index(&self, name: &str) -> GatewayResult<()> {
        self.inner.refresh_index(name).await
    }

    async fn write_document(&self, target: &str, doc: &ArticleDocument) -> GatewayResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_document(target, doc).await
    }

    async fn bulk_write(&self, index: &str, docs: &[ArticleDocument]) -> GatewayResult<()> {
        let call = self.bulk_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_bulk_on_call == Some(call) {
            let failures = docs
                .iter()
                .take(1)
                .map(|doc| BulkItemFailure {
                    operation: "index".to_string(),
                    document_id: doc.id.clone(),
                    status: 400,
                    reason: "mapper_parsing_exception".to_string(),
                })
                .collect();
            return Err(SearchGatewayError::PartialBulkFailure {
                index: index.to_string(),
                failures,
            });
        }
        self.inner.bulk_write(index, docs).await
    }

    async fn delete_document(&self, target: &str, id: &str) -> GatewayResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_document(target, id).await
    }

    async fn repoint_alias(&self, alias: &str, new_index: &str) -> GatewayResult<Vec<String>> {
        self.repoints.fetch_add(1, Ordering::SeqCst);
        self.inner.repoint_alias(alias, new_index).await
    }

    async fn alias_targets(&self, alias: &str) -> GatewayResult<Vec<String>> {
        self.inner.alias_targets(alias).await
    }

    async fn list_indices(&self, pattern: &str) -> GatewayResult<Vec<String>> {
        self.inner.list_indices(pattern).await
    }

    async fn search(&self, target: &str, query: &ArticleQuery) -> GatewayResult<Vec<Article>> {
        self.inner.search(target, query).await
    }
}
