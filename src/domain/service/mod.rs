pub mod document_mapper;

pub use document_mapper::{to_article, to_document};
