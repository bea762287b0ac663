pub mod article_repository;
pub mod search_gateway;
pub mod user_repository;

pub use article_repository::ArticleRepository;
pub use search_gateway::SearchGateway;
pub use user_repository::UserRepository;
