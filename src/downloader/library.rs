use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use super::error::DownloadError;
use super::naming::is_image_extension;

fn is_page_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    // 页面文件名是纯数字，扩展名要能被识别成图片
    !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) && is_image_extension(ext)
}

/// 章节目录里已经下载的页数，目录不存在时为 0
pub async fn downloaded_pages(chapter_dir: &Path) -> Result<usize, DownloadError> {
    let mut entries = match tokio::fs::read_dir(chapter_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() && is_page_file(&entry.path()) {
            count += 1;
        }
    }
    Ok(count)
}

/// 章节是否已完整下载
pub async fn is_chapter_downloaded(
    chapter_dir: &Path,
    expected_pages: usize,
) -> Result<bool, DownloadError> {
    if expected_pages == 0 {
        return Ok(false);
    }
    Ok(downloaded_pages(chapter_dir).await? >= expected_pages)
}

/// 删除已下载的章节，返回章节目录原本是否存在
///
/// 章节的上级目录（系列目录）变空时一并删除，但不会删掉 `downloads_dir` 本身
/// 或它以外的目录。
pub async fn delete_downloaded_chapter(
    chapter_dir: &Path,
    downloads_dir: &Path,
) -> Result<bool, DownloadError> {
    match tokio::fs::remove_dir_all(chapter_dir).await {
        Ok(()) => info!("已删除章节目录: {}", chapter_dir.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    }

    let series_dir = chapter_dir
        .parent()
        .filter(|dir| *dir != downloads_dir && dir.starts_with(downloads_dir));
    if let Some(series_dir) = series_dir {
        let mut entries = tokio::fs::read_dir(series_dir).await?;
        if entries.next_entry().await?.is_none() {
            debug!("系列目录已空，删除: {}", series_dir.display());
            tokio::fs::remove_dir(series_dir).await?;
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_page_file() {
        assert!(is_page_file(Path::new("/x/001.jpg")));
        assert!(is_page_file(Path::new("/x/12.webp")));
        assert!(is_page_file(Path::new("/x/3.PNG")));
        assert!(!is_page_file(Path::new("/x/cover.jpg")));
        assert!(!is_page_file(Path::new("/x/001.txt")));
        assert!(!is_page_file(Path::new("/x/.jpg")));
    }

    #[tokio::test]
    async fn test_downloaded_pages_counts_only_page_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let chapter = dir.path().join("Series").join("1 - Start");
        tokio::fs::create_dir_all(&chapter).await.unwrap();
        for name in ["1.jpg", "2.png", "notes.txt"] {
            tokio::fs::write(chapter.join(name), b"x").await.unwrap();
        }

        assert_eq!(downloaded_pages(&chapter).await.unwrap(), 2);
        assert!(is_chapter_downloaded(&chapter, 2).await.unwrap());
        assert!(!is_chapter_downloaded(&chapter, 3).await.unwrap());
        assert_eq!(downloaded_pages(&dir.path().join("missing")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_downloaded_chapter_removes_empty_series_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let series = dir.path().join("Series");
        let first = series.join("1");
        let second = series.join("2");
        tokio::fs::create_dir_all(&first).await.unwrap();
        tokio::fs::create_dir_all(&second).await.unwrap();

        assert!(delete_downloaded_chapter(&first, dir.path()).await.unwrap());
        assert!(series.exists());
        assert!(delete_downloaded_chapter(&second, dir.path()).await.unwrap());
        assert!(!series.exists());
        assert!(dir.path().exists());
        assert!(!delete_downloaded_chapter(&second, dir.path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_keeps_downloads_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("downloads");
        // 章节直接放在下载根目录下
        let chapter = root.join("Chapter 1");
        tokio::fs::create_dir_all(&chapter).await.unwrap();

        assert!(delete_downloaded_chapter(&chapter, &root).await.unwrap());
        assert!(!chapter.exists());
        assert!(root.is_dir());
    }
}
