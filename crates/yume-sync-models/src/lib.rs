pub mod entry;
pub mod mapping;
pub mod progress;
pub mod status;
pub mod watchlist;

pub use entry::{MediaTitle, SourceListEntry, SourceMedia};
pub use mapping::IdMapping;
pub use progress::ProgressSnapshot;
pub use status::{RemoteStatus, WatchStatus};
pub use watchlist::WatchlistEntry;
