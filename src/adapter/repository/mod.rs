pub mod article_postgres;
pub mod search_opensearch;
pub mod user_postgres;

pub use article_postgres::ArticlePostgresRepository;
pub use search_opensearch::SearchOpenSearchGateway;
pub use user_postgres::UserPostgresRepository;
