pub mod article;
pub mod article_document;
pub mod index_generation;
pub mod user;

pub use article::{Article, ArticleStatus, ArticleUpdate};
pub use article_document::{ArticleDocument, ArticleQuery};
pub use index_generation::{
    generation_index_name, is_generation_index, AnalyzerSettings, IndexSchema, ARTICLE_ALIAS,
    GENERATION_PREFIX,
};
pub use user::{Principal, User};
