pub mod create_article;
pub mod delete_article;
pub mod get_article;
pub mod reindex_search_engine;
pub mod retire_generations;
pub mod retry;
pub mod search_articles;
pub mod seed;
pub mod update_article;

pub use create_article::CreateArticleUseCase;
pub use delete_article::DeleteArticleUseCase;
pub use get_article::GetArticleUseCase;
pub use reindex_search_engine::ReindexSearchEngineUseCase;
pub use retire_generations::RetireGenerationsUseCase;
pub use search_articles::SearchArticlesUseCase;
pub use seed::SeedUseCase;
pub use update_article::UpdateArticleUseCase;
