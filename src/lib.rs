pub mod common;
pub mod downloader;
pub mod manifest;
pub mod state;

pub use downloader::{Downloader, DownloaderConfig};
