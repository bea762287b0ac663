use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::domain::entity::index_generation::{
    AnalyzerSettings, IndexSchema, ARTICLE_ALIAS, GENERATION_PREFIX,
};
use crate::infrastructure::database::{empty_secret, DatabaseConfig};
use crate::usecase::reindex_search_engine::ReindexSettings;
use crate::usecase::retry::RetryConfig;

/// Config はアプリケーション全体の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    pub opensearch: OpenSearchConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub reindex: ReindexConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path, e))?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        Ok(cfg)
    }

    /// 再構築ユースケースへ渡す実行パラメータを組み立てる。
    pub fn reindex_settings(&self) -> ReindexSettings {
        ReindexSettings {
            alias: self.search.alias.clone(),
            index_prefix: self.search.index_prefix.clone(),
            schema: IndexSchema::articles(&self.search.analyzer),
            page_size: self.reindex.page_size.max(1),
            timeout: self.reindex.timeout(),
            prefetch_next_page: self.reindex.prefetch_next_page,
            retry: RetryConfig::from(&self.reindex.retry),
        }
    }
}

/// AppConfig はアプリケーション設定。
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

/// OpenSearchConfig は検索エンジン接続の設定を表す。
#[derive(Debug, Clone, Deserialize)]
pub struct OpenSearchConfig {
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default = "empty_secret")]
    pub password: SecretString,
    /// true の場合は TLS 証明書を検証しない（開発環境向け）。
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

/// SearchConfig はインデックス命名とスキーマの設定。
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_alias")]
    pub alias: String,
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,
    #[serde(default)]
    pub analyzer: AnalyzerSettings,
    #[serde(default = "default_result_size")]
    pub result_size: u32,
}

fn default_alias() -> String {
    ARTICLE_ALIAS.to_string()
}

fn default_index_prefix() -> String {
    GENERATION_PREFIX.to_string()
}

fn default_result_size() -> u32 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            alias: default_alias(),
            index_prefix: default_index_prefix(),
            analyzer: AnalyzerSettings::default(),
            result_size: default_result_size(),
        }
    }
}

/// ReindexConfig はインデックス再構築の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct ReindexConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_reindex_timeout_secs")]
    pub timeout_secs: u64,
    /// true の場合、一括書き込み中に次ページを先読みする。
    #[serde(default)]
    pub prefetch_next_page: bool,
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_page_size() -> u32 {
    100
}

fn default_reindex_timeout_secs() -> u64 {
    600
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            timeout_secs: default_reindex_timeout_secs(),
            prefetch_next_page: false,
            retry: RetrySettings::default(),
        }
    }
}

impl ReindexConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// RetrySettings は一時的なエンジン障害に対するフェーズ単位リトライの設定。
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        RetryConfig::new(settings.max_attempts)
            .with_initial_delay(Duration::from_millis(settings.initial_delay_ms))
            .with_max_delay(Duration::from_millis(settings.max_delay_ms))
            .with_multiplier(settings.multiplier)
    }
}

/// SeedConfig はシード投入の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_seed_timeout_secs() -> u64 {
    300
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_seed_timeout_secs(),
        }
    }
}

impl SeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// LogConfig はログ出力形式の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}
