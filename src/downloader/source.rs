use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::models::FetchResult;
use super::naming::sanitize_path_component;
use crate::common::models::{Chapter, Series};

// 扩展源：把章节解析成页面地址，并负责拉取图片
#[async_trait]
pub trait ContentSource: Send + Sync {
    // 按顺序返回章节的全部页面地址
    async fn resolve_page_urls(
        &self,
        extension_id: &str,
        series_source_id: &str,
        chapter_source_id: &str,
    ) -> anyhow::Result<Vec<String>>;

    // 拉取单页图片，拿不到字节时返回 `FetchResult::NeedsDirectFetch`
    async fn fetch_image(
        &self,
        extension_id: &str,
        series: &Series,
        page_url: &str,
    ) -> anyhow::Result<FetchResult>;
}

// 章节图片在本地的存放目录
#[async_trait]
pub trait PathResolver: Send + Sync {
    async fn chapter_dir(
        &self,
        series: &Series,
        chapter: &Chapter,
        downloads_dir: &Path,
    ) -> anyhow::Result<PathBuf>;
}

/// 默认目录布局：`<downloads_dir>/<系列标题>/<话数 - 章节标题>`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathResolver;

impl DefaultPathResolver {
    pub fn chapter_dir_name(chapter: &Chapter) -> String {
        let title = chapter.title.trim();
        let name = if title.is_empty() {
            format!("Chapter {}", chapter.chapter_number)
        } else {
            format!("{} - {}", chapter.chapter_number, title)
        };
        sanitize_path_component(&name)
    }

    pub fn resolve(series: &Series, chapter: &Chapter, downloads_dir: &Path) -> PathBuf {
        downloads_dir
            .join(sanitize_path_component(&series.title))
            .join(Self::chapter_dir_name(chapter))
    }
}

#[async_trait]
impl PathResolver for DefaultPathResolver {
    async fn chapter_dir(
        &self,
        series: &Series,
        chapter: &Chapter,
        downloads_dir: &Path,
    ) -> anyhow::Result<PathBuf> {
        Ok(Self::resolve(series, chapter, downloads_dir))
    }
}
