use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entity::article::Article;
use crate::domain::entity::article_document::{ArticleDocument, ArticleQuery};
use crate::domain::entity::index_generation::IndexSchema;
use crate::domain::error::SearchGatewayError;
use crate::domain::repository::search_gateway::GatewayResult;
use crate::domain::repository::SearchGateway;
use crate::domain::service::document_mapper;

#[derive(Default)]
struct EngineState {
    /// インデックス名 → (ドキュメント ID → ドキュメント)
    indices: BTreeMap<String, BTreeMap<String, ArticleDocument>>,
    /// エイリアス名 → 付与先インデックス名
    aliases: HashMap<String, Vec<String>>,
}

impl EngineState {
    /// 書き込み先を1つのインデックスに解決する。
    /// エイリアスの付与先が1つでない場合は書き込めない。
    fn resolve_write(&self, target: &str) -> GatewayResult<String> {
        if let Some(targets) = self.aliases.get(target) {
            return match targets.as_slice() {
                [index] => Ok(index.clone()),
                _ => Err(SearchGatewayError::Rejected {
                    status: 400,
                    reason: format!("alias [{}] has more than one write index", target),
                }),
            };
        }
        if self.indices.contains_key(target) {
            return Ok(target.to_string());
        }
        Err(not_found(target))
    }

    fn resolve_read(&self, target: &str) -> GatewayResult<Vec<String>> {
        if let Some(targets) = self.aliases.get(target) {
            return Ok(targets.clone());
        }
        if self.indices.contains_key(target) {
            return Ok(vec![target.to_string()]);
        }
        Err(not_found(target))
    }
}

fn not_found(target: &str) -> SearchGatewayError {
    SearchGatewayError::Rejected {
        status: 404,
        reason: format!("index_not_found_exception: {}", target),
    }
}

fn matches_keyword(doc: &ArticleDocument, keyword: &str) -> bool {
    let keyword = keyword.to_lowercase();
    doc.title.to_lowercase().contains(&keyword) || doc.content.to_lowercase().contains(&keyword)
}

/// InMemorySearchGateway はエイリアスと世代インデックスを再現するインメモリ検索エンジン。
#[derive(Default)]
pub struct InMemorySearchGateway {
    state: RwLock<EngineState>,
}

impl InMemorySearchGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// target（インデックス名またはエイリアス名）から見えるドキュメント数。
    pub async fn document_count(&self, target: &str) -> usize {
        let state = self.state.read().await;
        state
            .resolve_read(target)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|index| state.indices.get(index))
                    .map(BTreeMap::len)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub async fn index_names(&self) -> Vec<String> {
        self.state.read().await.indices.keys().cloned().collect()
    }
}

#[async_trait]
impl SearchGateway for InMemorySearchGateway {
    async fn create_index(&self, name: &str, _schema: &IndexSchema) -> GatewayResult<()> {
        self.state
            .write()
            .await
            .indices
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_index(&self, name: &str) -> GatewayResult<()> {
        let mut state = self.state.write().await;
        if state.indices.remove(name).is_none() {
            return Err(not_found(name));
        }
        for targets in state.aliases.values_mut() {
            targets.retain(|index| index != name);
        }
        state.aliases.retain(|_, targets| !targets.is_empty());
        Ok(())
    }

    async fn refresh_index(&self, name: &str) -> GatewayResult<()> {
        let state = self.state.read().await;
        state.resolve_read(name).map(|_| ())
    }

    async fn write_document(&self, target: &str, doc: &ArticleDocument) -> GatewayResult<()> {
        let mut state = self.state.write().await;
        let index = state.resolve_write(target)?;
        if let Some(docs) = state.indices.get_mut(&index) {
            docs.insert(doc.id.clone(), doc.clone());
        }
        Ok(())
    }

    async fn bulk_write(&self, index: &str, docs: &[ArticleDocument]) -> GatewayResult<()> {
        let mut state = self.state.write().await;
        let index = state.resolve_write(index)?;
        if let Some(stored) = state.indices.get_mut(&index) {
            for doc in docs {
                stored.insert(doc.id.clone(), doc.clone());
            }
        }
        Ok(())
    }

    async fn delete_document(&self, target: &str, id: &str) -> GatewayResult<()> {
        let mut state = self.state.write().await;
        let index = state.resolve_write(target)?;
        if let Some(docs) = state.indices.get_mut(&index) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn repoint_alias(&self, alias: &str, new_index: &str) -> GatewayResult<Vec<String>> {
        let mut state = self.state.write().await;
        if !state.indices.contains_key(new_index) {
            return Err(not_found(new_index));
        }
        let previous = state
            .aliases
            .insert(alias.to_string(), vec![new_index.to_string()])
            .unwrap_or_default();
        Ok(previous)
    }

    async fn alias_targets(&self, alias: &str) -> GatewayResult<Vec<String>> {
        Ok(self
            .state
            .read()
            .await
            .aliases
            .get(alias)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_indices(&self, pattern: &str) -> GatewayResult<Vec<String>> {
        let prefix = pattern.trim_end_matches('*');
        Ok(self
            .state
            .read()
            .await
            .indices
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn search(&self, target: &str, query: &ArticleQuery) -> GatewayResult<Vec<Article>> {
        let state = self.state.read().await;
        let size = usize::try_from(query.size).unwrap_or(usize::MAX);
        Ok(state
            .resolve_read(target)?
            .iter()
            .filter_map(|index| state.indices.get(index))
            .flat_map(BTreeMap::values)
            .filter(|doc| query.status.is_none_or(|status| doc.status == status))
            .filter(|doc| matches_keyword(doc, &query.keyword))
            .filter_map(|doc| document_mapper::to_article(doc.clone()).ok())
            .take(size)
            .collect())
    }
}
