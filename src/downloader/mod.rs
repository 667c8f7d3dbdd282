pub mod core;
pub mod error;
pub mod library;
pub mod models;
pub mod naming;
pub mod observer;
pub mod progress;
pub mod queue;
pub mod source;

pub use self::core::{Downloader, DownloaderConfig};
pub use error::DownloadError;
pub use models::{DownloadErrorEntry, DownloadTask, DownloaderSnapshot, FetchResult};
pub use observer::{DownloadObserver, FanoutObserver, NoopObserver, SnapshotObserver};
pub use source::{ContentSource, DefaultPathResolver, PathResolver};
