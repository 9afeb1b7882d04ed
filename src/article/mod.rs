//! Article subsystem: storage, listing, tags, and highlights.

pub mod repository;
pub mod types;

pub use repository::{ArticleRepository, HighlightRepository, TagRepository};
pub use types::{
    Article, ArticleFilter, ArticleUpdate, Highlight, HighlightUpdate, NewArticle, NewHighlight,
    SortOrder, Tag,
};
