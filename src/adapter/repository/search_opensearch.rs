use async_trait::async_trait;
use opensearch::auth::Credentials;
use opensearch::cat::CatIndicesParts;
use opensearch::cert::CertificateValidation;
use opensearch::http::request::JsonBody;
use opensearch::http::response::Response;
use opensearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use opensearch::http::Url;
use opensearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetAliasParts,
    IndicesPutAliasParts, IndicesRefreshParts,
};
use opensearch::{BulkParts, DeleteParts, IndexParts, OpenSearch, SearchParts};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::entity::article::Article;
use crate::domain::entity::article_document::{ArticleDocument, ArticleQuery};
use crate::domain::entity::index_generation::IndexSchema;
use crate::domain::error::{BulkItemFailure, SearchGatewayError};
use crate::domain::repository::search_gateway::GatewayResult;
use crate::domain::repository::SearchGateway;
use crate::domain::service::document_mapper;
use crate::infrastructure::config::OpenSearchConfig;

/// SearchOpenSearchGateway は OpenSearch を使った SearchGateway 実装。
/// 起動時に1つだけ構築し、Arc で各ユースケースへ渡す。
pub struct SearchOpenSearchGateway {
    client: OpenSearch,
}

impl SearchOpenSearchGateway {
    pub fn new(cfg: &OpenSearchConfig) -> anyhow::Result<Self> {
        let url = Url::parse(&cfg.url)?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let cert_validation = if cfg.insecure_skip_verify {
            CertificateValidation::None
        } else {
            CertificateValidation::Default
        };
        let mut builder = TransportBuilder::new(conn_pool).cert_validation(cert_validation);

        let password = cfg.password.expose_secret();
        if !cfg.username.is_empty() && !password.is_empty() {
            builder = builder.auth(Credentials::Basic(
                cfg.username.clone(),
                password.to_string(),
            ));
        }

        let transport = builder.build()?;
        Ok(Self {
            client: OpenSearch::new(transport),
        })
    }

    /// 2xx 以外のレスポンスをエラーに変換する。
    async fn ensure_success(response: Response) -> GatewayResult<Response> {
        let status = response.status_code();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), body))
    }

    async fn read_json(response: Response) -> GatewayResult<Value> {
        response
            .json::<Value>()
            .await
            .map_err(|e| SearchGatewayError::InvalidResponse(e.to_string()))
    }
}

fn transport_error(e: opensearch::Error) -> SearchGatewayError {
    SearchGatewayError::Transient(e.to_string())
}

/// 429 と 5xx は一時的な障害、それ以外はリクエスト拒否として扱う。
fn status_error(status: u16, body: String) -> SearchGatewayError {
    if status == 429 || status >= 500 {
        SearchGatewayError::Transient(format!("status {}: {}", status, body))
    } else {
        SearchGatewayError::Rejected {
            status,
            reason: body,
        }
    }
}

fn is_already_exists(body: &str) -> bool {
    body.contains("resource_already_exists_exception")
}

fn is_mapping_conflict(body: &str) -> bool {
    body.contains("mapper_parsing_exception") || body.contains("mapper_exception")
}

/// インデックス作成失敗の分類。マッピング定義に起因する 400 のみ SchemaConflict とする。
fn create_index_error(index: &str, status: u16, body: String) -> SearchGatewayError {
    if status == 400 && is_mapping_conflict(&body) {
        SearchGatewayError::SchemaConflict {
            index: index.to_string(),
            reason: body,
        }
    } else {
        status_error(status, body)
    }
}

fn search_body(query: &ArticleQuery) -> Value {
    let mut filter = Vec::new();
    if let Some(status) = query.status {
        filter.push(json!({ "term": { "status": status.to_string() } }));
    }
    json!({
        "query": {
            "bool": {
                "must": [{
                    "multi_match": {
                        "query": query.keyword,
                        "fields": ["title", "content"]
                    }
                }],
                "filter": filter
            }
        }
    })
}

fn bulk_body(docs: &[ArticleDocument]) -> GatewayResult<Vec<JsonBody<Value>>> {
    let mut body = Vec::with_capacity(docs.len() * 2);
    for doc in docs {
        let source =
            serde_json::to_value(doc).map_err(|e| SearchGatewayError::Encode(e.to_string()))?;
        body.push(JsonBody::new(json!({ "index": { "_id": doc.id } })));
        body.push(JsonBody::new(source));
    }
    Ok(body)
}

/// 一括書き込みレスポンスから失敗した操作を取り出す。
fn bulk_failures(body: &Value) -> Vec<BulkItemFailure> {
    if !body["errors"].as_bool().unwrap_or(false) {
        return Vec::new();
    }
    body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object()?.iter().next())
                .filter_map(|(operation, result)| {
                    let error = result.get("error")?;
                    let reason = error["reason"]
                        .as_str()
                        .or_else(|| error["type"].as_str())
                        .map_or_else(|| error.to_string(), ToString::to_string);
                    Some(BulkItemFailure {
                        operation: operation.clone(),
                        document_id: result["_id"].as_str().unwrap_or_default().to_string(),
                        status: result["status"]
                            .as_u64()
                            .and_then(|s| u16::try_from(s).ok())
                            .unwrap_or_default(),
                        reason,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// エイリアス取得レスポンス `{ "<index>": { "aliases": {...} } }` から付与先を取り出す。
fn alias_target_names(body: &Value) -> Vec<String> {
    let mut names: Vec<String> = body
        .as_object()
        .map(|indices| indices.keys().cloned().collect())
        .unwrap_or_default();
    names.sort();
    names
}

fn alias_actions(alias: &str, previous: &[String], new_index: &str) -> Value {
    let mut actions: Vec<Value> = previous
        .iter()
        .filter(|index| index.as_str() != new_index)
        .map(|index| json!({ "remove": { "index": index, "alias": alias } }))
        .collect();
    actions.push(json!({ "add": { "index": new_index, "alias": alias } }));
    json!({ "actions": actions })
}

fn index_names(body: &Value) -> Vec<String> {
    let mut names: Vec<String> = body
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row["index"].as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// ヒットを記事に変換する。変換できないヒットはログに残して読み飛ばす。
fn hits_to_articles(body: &Value) -> Vec<Article> {
    body["hits"]["hits"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| {
                    let doc: ArticleDocument =
                        match serde_json::from_value(hit["_source"].clone()) {
                            Ok(doc) => doc,
                            Err(e) => {
                                warn!(id = %hit["_id"], error = %e, "skipping undecodable hit");
                                return None;
                            }
                        };
                    match document_mapper::to_article(doc) {
                        Ok(article) => Some(article),
                        Err(e) => {
                            warn!(id = %hit["_id"], error = %e, "skipping unmappable hit");
                            None
                        }
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl SearchGateway for SearchOpenSearchGateway {
    async fn create_index(&self, name: &str, schema: &IndexSchema) -> GatewayResult<()> {
        let exists = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[name]))
            .send()
            .await
            .map_err(transport_error)?;
        if exists.status_code().is_success() {
            debug!(index = name, "index already exists");
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(name))
            .body(schema.to_request_body())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status_code().as_u16();
        if response.status_code().is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if is_already_exists(&body) {
            debug!(index = name, "index created concurrently");
            return Ok(());
        }
        Err(create_index_error(name, status, body))
    }

    async fn delete_index(&self, name: &str) -> GatewayResult<()> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[name]))
            .send()
            .await
            .map_err(transport_error)?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn refresh_index(&self, name: &str) -> GatewayResult<()> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[name]))
            .send()
            .await
            .map_err(transport_error)?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn write_document(&self, target: &str, doc: &ArticleDocument) -> GatewayResult<()> {
        let response = self
            .client
            .index(IndexParts::IndexId(target, &doc.id))
            .body(doc)
            .send()
            .await
            .map_err(transport_error)?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn bulk_write(&self, index: &str, docs: &[ArticleDocument]) -> GatewayResult<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(bulk_body(docs)?)
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::ensure_success(response).await?;
        let body = Self::read_json(response).await?;

        let failures = bulk_failures(&body);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(SearchGatewayError::PartialBulkFailure {
                index: index.to_string(),
                failures,
            })
        }
    }

    async fn delete_document(&self, target: &str, id: &str) -> GatewayResult<()> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(target, id))
            .send()
            .await
            .map_err(transport_error)?;
        // 未登録のドキュメントは削除済みとみなす
        if response.status_code().as_u16() == 404 {
            let body = Self::read_json(response).await?;
            if body["result"].as_str() == Some("not_found") {
                debug!(target, id, "document already absent");
                return Ok(());
            }
            return Err(SearchGatewayError::Rejected {
                status: 404,
                reason: body.to_string(),
            });
        }
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn repoint_alias(&self, alias: &str, new_index: &str) -> GatewayResult<Vec<String>> {
        let previous = self.alias_targets(alias).await?;

        if previous.is_empty() {
            // 発見と付与の間は排他されない。同時に走った再構築は後勝ちになる。
            warn!(alias, index = new_index, "alias does not exist yet, creating it");
            let response = self
                .client
                .indices()
                .put_alias(IndicesPutAliasParts::IndexName(&[new_index], alias))
                .send()
                .await
                .map_err(transport_error)?;
            Self::ensure_success(response).await?;
            return Ok(previous);
        }

        let response = self
            .client
            .indices()
            .update_aliases()
            .body(alias_actions(alias, &previous, new_index))
            .send()
            .await
            .map_err(transport_error)?;
        Self::ensure_success(response).await?;
        Ok(previous)
    }

    async fn alias_targets(&self, alias: &str) -> GatewayResult<Vec<String>> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(transport_error)?;
        if response.status_code().as_u16() == 404 {
            return Ok(Vec::new());
        }
        let response = Self::ensure_success(response).await?;
        Ok(alias_target_names(&Self::read_json(response).await?))
    }

    async fn list_indices(&self, pattern: &str) -> GatewayResult<Vec<String>> {
        let response = self
            .client
            .cat()
            .indices(CatIndicesParts::Index(&[pattern]))
            .format("json")
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::ensure_success(response).await?;
        Ok(index_names(&Self::read_json(response).await?))
    }

    async fn search(&self, target: &str, query: &ArticleQuery) -> GatewayResult<Vec<Article>> {
        let response = self
            .client
            .search(SearchParts::Index(&[target]))
            .size(i64::from(query.size))
            .body(search_body(query))
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::ensure_success(response).await?;
        Ok(hits_to_articles(&Self::read_json(response).await?))
    }
}
