pub mod file_store;
pub mod traits;
pub mod repository;

pub use file_store::FileArticleStore;
pub use traits::{
    ArticleStore, CachedArticle, StoreStats, MemoryArticleStore,
    sort_newest_first, CATEGORY_TOP_HEADLINES
};
pub use repository::{NewsRepository, Repository, RepositoryStats};
