use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::common::models::{Chapter, Series};

/// 一个章节的下载任务
///
/// 队列中以 `chapter.id` 去重。`page` 只有在任务开始处理后才会出现，
/// 表示下一张要下载的页（从 1 开始），暂停后据此续传。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    pub chapter: Chapter,
    pub series: Series,
    pub downloads_dir: PathBuf,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub total_pages: Option<usize>,
    // 已解析出的页面地址，续传时不必再问扩展源
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_urls: Option<Vec<String>>,
}

impl DownloadTask {
    pub fn new(series: Series, chapter: Chapter, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            chapter,
            series,
            downloads_dir: downloads_dir.into(),
            page: None,
            total_pages: None,
            page_urls: None,
        }
    }

    pub fn chapter_id(&self) -> &str {
        &self.chapter.id
    }
}

// --------------------------------------------------------------------

/// 导致队列停止的错误记录，只追加不自动清除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadErrorEntry {
    pub chapter: Chapter,
    pub series: Series,
    pub error_str: String,
}

/// 扩展源拉取图片的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Bytes(Vec<u8>),
    // 扩展源无法直接给出数据，需要自己用 HTTP GET 拉取
    NeedsDirectFetch(String),
}

/// 推送给观察者的完整状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DownloaderSnapshot {
    pub running: bool,
    pub queue: Vec<DownloadTask>,
    pub current: Option<DownloadTask>,
    pub errors: Vec<DownloadErrorEntry>,
}
