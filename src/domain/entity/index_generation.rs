use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 読み取り・ライブ書き込みが常に対象とする固定エイリアス名。
pub const ARTICLE_ALIAS: &str = "articles";

/// 世代インデックス名のプレフィックス。後ろに分単位のタイムスタンプが付く。
pub const GENERATION_PREFIX: &str = "article_";

const GENERATION_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";
const GENERATION_TIMESTAMP_LEN: usize = 12;

/// 再構築1回分の世代インデックス名を生成する（例: `article_202601021504`）。
pub fn generation_index_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}{}", prefix, now.format(GENERATION_TIMESTAMP_FORMAT))
}

/// name が prefix で始まる世代インデックス名かを判定する。
/// プレフィックスの後ろが12桁の数字でない名前は世代インデックスとみなさない。
pub fn is_generation_index(prefix: &str, name: &str) -> bool {
    name.strip_prefix(prefix).is_some_and(|suffix| {
        suffix.len() == GENERATION_TIMESTAMP_LEN && suffix.bytes().all(|b| b.is_ascii_digit())
    })
}

/// AnalyzerSettings は全文検索フィールドに適用するカスタムアナライザー。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    #[serde(default = "default_analyzer_name")]
    pub name: String,
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,
    #[serde(default = "default_filters")]
    pub filters: Vec<String>,
}

fn default_analyzer_name() -> String {
    "ja_analyzer".to_string()
}

fn default_tokenizer() -> String {
    "kuromoji_tokenizer".to_string()
}

fn default_filters() -> Vec<String> {
    vec![
        "kuromoji_baseform".to_string(),
        "lowercase".to_string(),
        "icu_normalizer".to_string(),
    ]
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            name: default_analyzer_name(),
            tokenizer: default_tokenizer(),
            filters: default_filters(),
        }
    }
}

/// IndexSchema はインデックス作成時のマッピングと設定。
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSchema {
    pub mappings: Value,
    pub settings: Value,
}

impl IndexSchema {
    /// 記事インデックスの固定スキーマ。
    /// id/status は keyword、title/content はアナライザー付き text、タイムスタンプは date。
    pub fn articles(analyzer: &AnalyzerSettings) -> Self {
        let text = json!({ "type": "text", "analyzer": analyzer.name });
        let mut analyzers = serde_json::Map::new();
        analyzers.insert(
            analyzer.name.clone(),
            json!({
                "type": "custom",
                "tokenizer": analyzer.tokenizer,
                "filter": analyzer.filters
            }),
        );
        Self {
            mappings: json!({
                "properties": {
                    "id": { "type": "keyword" },
                    "title": text,
                    "content": text,
                    "status": { "type": "keyword" },
                    "created_at": { "type": "date" },
                    "updated_at": { "type": "date" }
                }
            }),
            settings: json!({
                "analysis": {
                    "analyzer": analyzers
                }
            }),
        }
    }

    /// インデックス作成 API のリクエストボディ。
    pub fn to_request_body(&self) -> Value {
        json!({
            "settings": self.settings,
            "mappings": self.mappings
        })
    }
}
