//! シード投入 → 再構築 → 検索の一連の流れの統合テスト

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use k1s0_article_search::domain::entity::article::ArticleStatus;
use k1s0_article_search::domain::repository::{SearchGateway, UserRepository};
use k1s0_article_search::test_support::{
    InMemoryArticleRepository, InMemorySearchGateway, InMemoryUserRepository,
};
use k1s0_article_search::usecase::reindex_search_engine::ReindexSettings;
use k1s0_article_search::usecase::{ReindexSearchEngineUseCase, SearchArticlesUseCase, SeedUseCase};

#[tokio::test]
async fn test_seed_rebuild_and_search_returns_only_published() {
    let users = Arc::new(InMemoryUserRepository::new());
    let store = Arc::new(InMemoryArticleRepository::new());
    let engine = Arc::new(InMemorySearchGateway::new());

    let reindex =
        ReindexSearchEngineUseCase::new(store.clone(), engine.clone(), ReindexSettings::default());
    let report = SeedUseCase::new(users.clone(), store.clone(), reindex)
        .execute()
        .await
        .unwrap();

    assert_eq!(report.users.len(), 2);
    assert_eq!(report.articles.len(), 2);
    assert_eq!(store.len().await, 2);
    assert_eq!(report.reindex.documents, 2);
    assert_eq!(
        engine.alias_targets("articles").await.unwrap(),
        vec![report.reindex.generation.clone()]
    );

    let hits = SearchArticlesUseCase::new(engine.clone(), "articles", 10)
        .execute("first")
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].status, ArticleStatus::Published);
    assert!(hits[0].title.to_lowercase().contains("first"));
}

#[tokio::test]
async fn test_seed_reuses_existing_users() {
    let users = Arc::new(InMemoryUserRepository::new());
    let store = Arc::new(InMemoryArticleRepository::new());
    let engine = Arc::new(InMemorySearchGateway::new());

    for minute in 0..2 {
        let reindex = ReindexSearchEngineUseCase::new(
            store.clone(),
            engine.clone(),
            ReindexSettings::default(),
        )
        .with_clock(move || Utc.with_ymd_and_hms(2026, 1, 2, 15, minute, 0).unwrap());
        SeedUseCase::new(users.clone(), store.clone(), reindex)
            .execute()
            .await
            .unwrap();
    }

    let admin = users.find_by_uid("admin123").await.unwrap().unwrap();
    assert_eq!(admin.id, 1);
    assert!(users.find_by_uid("admin456").await.unwrap().is_some());
    assert!(users.find_by_id(3).await.unwrap().is_none());
    assert_eq!(store.len().await, 4);
}
