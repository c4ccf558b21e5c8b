pub mod anilist;
pub mod error;
pub mod traits;

pub use anilist::{AniListClient, ViewerProfile};
pub use error::SourceError;
pub use traits::{
    AnimeInfo, CatalogProvider, ListSource, MappingStore, ProgressSink, SearchHit, WatchlistStore,
};
