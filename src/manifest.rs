//! 章节清单
//!
//! 命令行没有真正的扩展系统，章节和页面地址由一个 JSON 清单提供：
//!
//! ```json
//! {
//!   "series": [{
//!     "id": "s1", "extension_id": "ext", "source_id": "remote-s1", "title": "Series",
//!     "chapters": [{
//!       "id": "c1", "source_id": "remote-c1", "chapter_number": "1", "title": "Start",
//!       "pages": ["https://cdn.example.com/1.jpg", "https://cdn.example.com/2.png"]
//!     }]
//!   }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::common::models::{Chapter, Series};
use crate::downloader::{ContentSource, DownloadTask, FetchResult};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("读取清单失败: {0}")]
    IoError(#[from] std::io::Error),

    #[error("清单格式错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("清单中找不到章节: {0}")]
    ChapterNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestChapter {
    #[serde(flatten)]
    pub chapter: Chapter,
    #[serde(default)]
    pub pages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSeries {
    #[serde(flatten)]
    pub series: Series,
    #[serde(default)]
    pub chapters: Vec<ManifestChapter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub series: Vec<ManifestSeries>,
}

impl Manifest {
    pub async fn load(path: &Path) -> Result<Self, ManifestError> {
        let data = tokio::fs::read_to_string(path).await?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_str(data)?;
        debug!(
            "清单: {} 个系列, {} 个章节",
            manifest.series.len(),
            manifest.series.iter().map(|s| s.chapters.len()).sum::<usize>()
        );
        Ok(manifest)
    }

    // 按清单顺序遍历所有章节
    pub fn chapters(&self) -> impl Iterator<Item = (&ManifestSeries, &ManifestChapter)> {
        self.series
            .iter()
            .flat_map(|s| s.chapters.iter().map(move |c| (s, c)))
    }

    pub fn find_chapter(
        &self,
        chapter_id: &str,
    ) -> Result<(&ManifestSeries, &ManifestChapter), ManifestError> {
        self.chapters()
            .find(|(_, c)| c.chapter.id == chapter_id)
            .ok_or_else(|| ManifestError::ChapterNotFound(chapter_id.to_string()))
    }

    /// 生成下载任务，可按系列或章节过滤
    pub fn tasks(
        &self,
        downloads_dir: &Path,
        series_id: Option<&str>,
        chapter_id: Option<&str>,
    ) -> Vec<DownloadTask> {
        self.chapters()
            .filter(|(s, _)| series_id.is_none_or(|id| s.series.id == id))
            .filter(|(_, c)| chapter_id.is_none_or(|id| c.chapter.id == id))
            .map(|(s, c)| DownloadTask::new(s.series.clone(), c.chapter.clone(), downloads_dir))
            .collect()
    }
}

/// 基于清单的扩展源：页面地址来自清单，图片一律直接 HTTP 拉取
#[derive(Debug, Clone, Default)]
pub struct ManifestSource {
    // (extension_id, series source_id, chapter source_id) -> 页面地址
    pages: HashMap<(String, String, String), Vec<String>>,
}

impl ManifestSource {
    pub fn new(manifest: &Manifest) -> Self {
        let pages = manifest
            .chapters()
            .map(|(s, c)| {
                (
                    (
                        s.series.extension_id.clone(),
                        s.series.source_id.clone(),
                        c.chapter.source_id.clone(),
                    ),
                    c.pages.clone(),
                )
            })
            .collect();
        Self { pages }
    }
}

#[async_trait]
impl ContentSource for ManifestSource {
    async fn resolve_page_urls(
        &self,
        extension_id: &str,
        series_source_id: &str,
        chapter_source_id: &str,
    ) -> anyhow::Result<Vec<String>> {
        let key = (
            extension_id.to_string(),
            series_source_id.to_string(),
            chapter_source_id.to_string(),
        );
        self.pages
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("清单中没有章节 {} 的页面", chapter_source_id))
    }

    async fn fetch_image(
        &self,
        _extension_id: &str,
        _series: &Series,
        page_url: &str,
    ) -> anyhow::Result<FetchResult> {
        Ok(FetchResult::NeedsDirectFetch(page_url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "series": [
            {
                "id": "s1", "extension_id": "ext", "source_id": "rs1", "title": "First",
                "chapters": [
                    { "id": "c1", "source_id": "rc1", "chapter_number": "1", "title": "Start",
                      "pages": ["http://a/1.jpg", "http://a/2.png"] },
                    { "id": "c2", "source_id": "rc2", "chapter_number": "2",
                      "pages": ["http://a/3.jpg"] }
                ]
            },
            {
                "id": "s2", "extension_id": "ext", "source_id": "rs2", "title": "Second",
                "chapters": [
                    { "id": "c3", "source_id": "rc1", "chapter_number": "1", "pages": [] }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_and_filter_tasks() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        let dir = Path::new("/downloads");

        assert_eq!(manifest.tasks(dir, None, None).len(), 3);
        assert_eq!(manifest.tasks(dir, Some("s1"), None).len(), 2);

        let only = manifest.tasks(dir, None, Some("c2"));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].series.title, "First");
        assert_eq!(only[0].chapter.title, "");
        assert_eq!(only[0].downloads_dir, dir);
        assert_eq!(only[0].page, None);
    }

    #[test]
    fn test_find_chapter() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        let (series, chapter) = manifest.find_chapter("c3").unwrap();
        assert_eq!(series.series.id, "s2");
        assert!(chapter.pages.is_empty());
        assert!(matches!(
            manifest.find_chapter("nope"),
            Err(ManifestError::ChapterNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_manifest_source_keys_by_series_and_chapter() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        let source = ManifestSource::new(&manifest);

        let pages = source.resolve_page_urls("ext", "rs1", "rc1").await.unwrap();
        assert_eq!(pages, vec!["http://a/1.jpg", "http://a/2.png"]);
        // 同一个章节 source_id 在不同系列下互不影响
        assert!(source.resolve_page_urls("ext", "rs2", "rc1").await.unwrap().is_empty());
        assert!(source.resolve_page_urls("ext", "rs9", "rc1").await.is_err());

        let series = &manifest.series[0].series;
        let fetched = source.fetch_image("ext", series, "http://a/1.jpg").await.unwrap();
        assert_eq!(fetched, FetchResult::NeedsDirectFetch("http://a/1.jpg".to_string()));
    }

    #[test]
    fn test_invalid_manifest() {
        assert!(matches!(
            Manifest::from_json("{ \"series\": 3 }"),
            Err(ManifestError::Json(_))
        ));
    }
}
