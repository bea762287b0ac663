use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use k1s0_article_search::adapter::repository::{
    ArticlePostgresRepository, SearchOpenSearchGateway, UserPostgresRepository,
};
use k1s0_article_search::domain::repository::{ArticleRepository, SearchGateway};
use k1s0_article_search::infrastructure::config::Config;
use k1s0_article_search::infrastructure::{database, logger};
use k1s0_article_search::usecase::retire_generations::RetireGenerationsInput;
use k1s0_article_search::usecase::{
    ReindexSearchEngineUseCase, RetireGenerationsUseCase, SearchArticlesUseCase, SeedUseCase,
};

#[derive(Parser, Debug)]
#[command(name = "k1s0-article-search", version, about = "記事検索インデックスの運用コマンド")]
struct Cli {
    /// 設定ファイルのパス
    #[arg(long, env = "CONFIG_PATH", default_value = "config/config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 記録系から新しい世代インデックスを構築し、エイリアスを張り替える
    Reindex {
        /// 制限時間（秒）。省略時は設定ファイルの値
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// 初期ユーザーと初期記事を投入し、インデックスを再構築する
    Seed,
    /// エイリアスから外れた古い世代インデックスを削除する
    Retire {
        /// 削除せずに残す世代数（新しい順）
        #[arg(long, default_value_t = 1)]
        keep: usize,
    },
    /// 公開済み記事をキーワード検索する
    Search { keyword: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    logger::init_logger(&cfg.app.environment, &cfg.log.format);

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        command = ?cli.command,
        "starting article search"
    );

    let gateway: Arc<dyn SearchGateway> = Arc::new(
        SearchOpenSearchGateway::new(&cfg.opensearch)
            .context("failed to build search engine client")?,
    );

    match cli.command {
        Commands::Reindex { timeout_secs } => {
            let pool = connect_database(&cfg).await?;
            let article_repo: Arc<dyn ArticleRepository> =
                Arc::new(ArticlePostgresRepository::new(pool));
            let mut settings = cfg.reindex_settings();
            if let Some(secs) = timeout_secs {
                settings.timeout = Duration::from_secs(secs);
            }
            let report = ReindexSearchEngineUseCase::new(article_repo, gateway, settings)
                .execute()
                .await?;
            info!(
                generation = %report.generation,
                pages = report.pages,
                documents = report.documents,
                previous = ?report.previous_generations,
                "インデックスの再構築が完了しました"
            );
        }
        Commands::Seed => {
            let pool = connect_database(&cfg).await?;
            let article_repo: Arc<dyn ArticleRepository> =
                Arc::new(ArticlePostgresRepository::new(pool.clone()));
            let user_repo = Arc::new(UserPostgresRepository::new(pool));
            let mut settings = cfg.reindex_settings();
            settings.timeout = cfg.seed.timeout();
            let reindex =
                ReindexSearchEngineUseCase::new(article_repo.clone(), gateway, settings);
            let report = SeedUseCase::new(user_repo, article_repo, reindex)
                .execute()
                .await?;
            info!(
                users = report.users.len(),
                articles = report.articles.len(),
                generation = %report.reindex.generation,
                "シードデータの投入が完了しました"
            );
        }
        Commands::Retire { keep } => {
            let input = RetireGenerationsInput {
                alias: cfg.search.alias.clone(),
                index_prefix: cfg.search.index_prefix.clone(),
                keep,
            };
            let report = RetireGenerationsUseCase::new(gateway)
                .execute(&input)
                .await?;
            info!(
                live = ?report.live,
                kept = ?report.kept,
                deleted = ?report.deleted,
                "古い世代インデックスを削除しました"
            );
        }
        Commands::Search { keyword } => {
            let articles =
                SearchArticlesUseCase::new(gateway, cfg.search.alias.clone(), cfg.search.result_size)
                    .execute(&keyword)
                    .await?;
            for article in &articles {
                println!("{}\t{}\t{}", article.id, article.status, article.title);
            }
            info!(hits = articles.len(), "search completed");
        }
    }

    Ok(())
}

/// DATABASE_URL が設定されていれば設定ファイルの database セクションより優先する。
async fn connect_database(cfg: &Config) -> anyhow::Result<Arc<sqlx::PgPool>> {
    let max_connections = cfg.database.as_ref().map_or(10, |db| db.max_open_conns);
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => cfg
            .database
            .as_ref()
            .map(database::DatabaseConfig::connection_url)
            .context("database is not configured (set DATABASE_URL or the database section)")?,
    };
    let pool = database::connect(&url, max_connections)
        .await
        .context("failed to connect to database")?;
    info!("database connection pool established");
    Ok(Arc::new(pool))
}
