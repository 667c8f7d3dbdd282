use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::DownloadError;
use super::models::{DownloadErrorEntry, DownloadTask, DownloaderSnapshot, FetchResult};
use super::naming::{extension_from_url, is_http_url, page_file_name};
use super::observer::{DownloadObserver, NoopObserver};
use super::queue::TaskQueue;
use super::source::{ContentSource, DefaultPathResolver, PathResolver};
use crate::common::client::client::{DEFAULT_TIMEOUT, HttpClient};
use crate::common::models::Series;

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    // 单次解析页面 / 拉取图片的超时，None 表示不限
    pub fetch_timeout: Option<Duration>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

// 一次 start() 对应一个运行句柄，pause() 取消它
#[derive(Debug, Clone)]
struct RunHandle {
    generation: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct DownloaderState {
    queue: TaskQueue,
    current: Option<DownloadTask>,
    errors: Vec<DownloadErrorEntry>,
    run: Option<RunHandle>,
    generation: u64,
}

impl DownloaderState {
    fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|r| !r.token.is_cancelled())
    }
}

enum ChapterOutcome {
    Completed,
    Interrupted,
}

/// 章节下载器
///
/// 一次只处理一个章节、一页一页地下载。`pause()` 只是一个建议：
/// 正在进行的请求不会被打断，循环在当前页写完后才会退出，
/// 并把剩余部分（带着续传页码）放回队首。
///
/// 任何一页失败都会停止整个队列，失败的章节不会重新入队，
/// 只会在错误列表里留下一条记录。
pub struct Downloader {
    source: Arc<dyn ContentSource>,
    path_resolver: Arc<dyn PathResolver>,
    http: HttpClient,
    observer: Arc<dyn DownloadObserver>,
    config: DownloaderConfig,
    state: Mutex<DownloaderState>,
    // 状态修改和对应的通知在这把锁下成对完成，观察者不会先收到新快照再收到旧快照；
    // 可重入，回调里可以再调用 pause()/add()
    publish: ReentrantMutex<()>,
    // 保证同一时间只有一个处理循环
    loop_guard: tokio::sync::Mutex<()>,
}

impl Downloader {
    pub fn new(source: Arc<dyn ContentSource>, http: HttpClient) -> Self {
        Self {
            source,
            path_resolver: Arc::new(DefaultPathResolver),
            http,
            observer: Arc::new(NoopObserver),
            config: DownloaderConfig::default(),
            state: Mutex::new(DownloaderState::default()),
            publish: ReentrantMutex::new(()),
            loop_guard: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_path_resolver(mut self, path_resolver: Arc<dyn PathResolver>) -> Self {
        self.path_resolver = path_resolver;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn DownloadObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_config(mut self, config: DownloaderConfig) -> Self {
        self.config = config;
        self
    }

    // ---------------------------------------------------------------------------------------
    // 对外操作

    /// 追加任务到队尾，已在队列中的章节会被忽略，返回实际入队数量
    pub fn add(&self, tasks: Vec<DownloadTask>) -> usize {
        let requested = tasks.len();
        let _publish = self.publish.lock();
        let (added, queue) = {
            let mut state = self.state.lock();
            let added = state.queue.extend(tasks);
            (added, state.queue.to_vec())
        };

        if added < requested {
            debug!("忽略 {} 个重复的任务", requested - added);
        }
        info!("添加 {} 个下载任务，队列长度: {}", added, queue.len());
        self.observer.on_queue_changed(&queue);
        added
    }

    /// 处理队列直到队列清空、被暂停或出错
    ///
    /// 已经在运行时直接返回。错误不会向调用方抛出，只会记录在 [`Self::errors`] 里。
    /// 如果上一次暂停的循环还没退出，会等它把章节放回队首后再继续。
    pub async fn start(&self) {
        let run = {
            let _publish = self.publish.lock();
            let run = {
                let mut state = self.state.lock();
                if state.is_running() {
                    debug!("下载器已在运行");
                    return;
                }
                // 暂停后仍在收尾的章节也算待处理的任务
                if state.queue.is_empty() && state.current.is_none() {
                    state.run = None;
                    None
                } else {
                    state.generation += 1;
                    let run = RunHandle {
                        generation: state.generation,
                        token: CancellationToken::new(),
                    };
                    state.run = Some(run.clone());
                    Some(run)
                }
            };
            self.observer.on_running_changed(run.is_some());
            run
        };

        let Some(run) = run else {
            debug!("队列为空，无需启动");
            return;
        };
        info!("▶ 下载器启动");

        // 上一次暂停的循环可能还在写最后一页，等它把任务放回队首
        let _guard = self.loop_guard.lock().await;
        self.process_queue(&run.token).await;

        let _publish = self.publish.lock();
        let (running, queue) = {
            let mut state = self.state.lock();
            state.current = None;
            if state
                .run
                .as_ref()
                .is_some_and(|r| r.generation == run.generation)
            {
                state.run = None;
            }
            (state.is_running(), state.queue.to_vec())
        };

        info!("■ 下载器停止，剩余任务: {}", queue.len());
        self.observer.on_current_changed(None);
        self.observer.on_queue_changed(&queue);
        self.observer.on_running_changed(running);
    }

    /// 请求暂停，当前页写完后循环才会真正退出
    pub fn pause(&self) {
        let _publish = self.publish.lock();
        let run = self.state.lock().run.take();
        if let Some(run) = run {
            info!("⏸ 请求暂停下载");
            run.token.cancel();
        }
        self.observer.on_running_changed(false);
    }

    /// 清空等待中的任务，不影响正在下载的章节
    pub fn clear(&self) {
        let _publish = self.publish.lock();
        let cleared = {
            let mut state = self.state.lock();
            let len = state.queue.len();
            state.queue.clear();
            len
        };
        info!("清空下载队列，移除 {} 个任务", cleared);
        self.observer.on_queue_changed(&[]);
    }

    /// 从队列中移除一个等待中的章节
    pub fn remove(&self, chapter_id: &str) -> Option<DownloadTask> {
        let _publish = self.publish.lock();
        let (removed, queue) = {
            let mut state = self.state.lock();
            let removed = state.queue.remove(chapter_id);
            (removed, state.queue.to_vec())
        };
        if removed.is_some() {
            self.observer.on_queue_changed(&queue);
        }
        removed
    }

    pub fn clear_errors(&self) {
        let _publish = self.publish.lock();
        self.state.lock().errors.clear();
        self.observer.on_errors_changed(&[]);
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().is_running()
    }

    pub fn queue(&self) -> Vec<DownloadTask> {
        self.state.lock().queue.to_vec()
    }

    pub fn current_task(&self) -> Option<DownloadTask> {
        self.state.lock().current.clone()
    }

    pub fn errors(&self) -> Vec<DownloadErrorEntry> {
        self.state.lock().errors.clone()
    }

    pub fn snapshot(&self) -> DownloaderSnapshot {
        let state = self.state.lock();
        DownloaderSnapshot {
            running: state.is_running(),
            queue: state.queue.to_vec(),
            current: state.current.clone(),
            errors: state.errors.clone(),
        }
    }

    // ---------------------------------------------------------------------------------------
    // 处理循环

    async fn process_queue(&self, token: &CancellationToken) {
        loop {
            if token.is_cancelled() {
                break;
            }

            let mut task = {
                let _publish = self.publish.lock();
                let (task, current, queue) = {
                    let mut state = self.state.lock();
                    let Some(task) = state.queue.pop_front() else {
                        break;
                    };
                    // 续传任务的 page 是下一张要下载的页，当前任务里要换成已写完的页
                    let current = DownloadTask {
                        page: task.page.and_then(|p| p.checked_sub(1)).filter(|p| *p > 0),
                        ..task.clone()
                    };
                    state.current = Some(current.clone());
                    (task, current, state.queue.to_vec())
                };
                self.observer.on_queue_changed(&queue);
                self.observer.on_current_changed(Some(&current));
                task
            };

            info!(
                "开始下载: {} / {}{}",
                task.series.title,
                task.chapter.display_name(),
                task.page
                    .map(|p| format!("（从第{}页继续）", p))
                    .unwrap_or_default()
            );

            match self.download_chapter(&mut task, token).await {
                Ok(ChapterOutcome::Completed) => {
                    info!("✅ 章节下载完成: {}", task.chapter.display_name());
                }
                Ok(ChapterOutcome::Interrupted) => {
                    info!(
                        "章节在第{}页暂停，放回队首: {}",
                        task.page.unwrap_or(1),
                        task.chapter.display_name()
                    );
                    let _publish = self.publish.lock();
                    let queue = {
                        let mut state = self.state.lock();
                        state.queue.push_front(task);
                        state.queue.to_vec()
                    };
                    self.observer.on_queue_changed(&queue);
                    break;
                }
                Err(e) => {
                    error!("❌ 章节下载失败: {}, 错误: {}", task.chapter.display_name(), e);
                    self.record_error(&task, &e);
                    token.cancel();
                    break;
                }
            }
        }
    }

    async fn download_chapter(
        &self,
        task: &mut DownloadTask,
        token: &CancellationToken,
    ) -> Result<ChapterOutcome, DownloadError> {
        let page_urls = match (task.page, task.page_urls.clone()) {
            (Some(_), Some(urls)) => urls,
            _ => {
                let urls = self.resolve_page_urls(task).await?;
                task.page_urls = Some(urls.clone());
                urls
            }
        };
        let total_pages = page_urls.len();
        task.total_pages = Some(total_pages);

        let chapter_dir = self.prepare_chapter_dir(task).await?;

        let mut page = task.page.unwrap_or(1).max(1);
        while page <= total_pages {
            if token.is_cancelled() {
                break;
            }

            let url = &page_urls[page - 1];
            let bytes = self.fetch_page(&task.series, url).await?;

            let file_name = page_file_name(page, total_pages, &extension_from_url(url));
            let file_path = chapter_dir.join(&file_name);
            tokio::fs::write(&file_path, &bytes).await?;
            debug!("写入第 {}/{} 页: {}", page, total_pages, file_path.display());

            // 当前任务里的 page 表示已写完的页，队列里的 page 表示下一张要下载的页
            let progress = DownloadTask {
                page: Some(page),
                ..task.clone()
            };
            {
                let _publish = self.publish.lock();
                self.state.lock().current = Some(progress.clone());
                self.observer.on_current_changed(Some(&progress));
            }

            page += 1;
        }

        if page > total_pages {
            Ok(ChapterOutcome::Completed)
        } else {
            task.page = Some(page);
            Ok(ChapterOutcome::Interrupted)
        }
    }

    async fn resolve_page_urls(&self, task: &DownloadTask) -> Result<Vec<String>, DownloadError> {
        debug!(
            "解析页面地址: extension={}, series={}, chapter={}",
            task.series.extension_id, task.series.source_id, task.chapter.source_id
        );

        let urls = self
            .with_timeout(
                "解析页面地址",
                &task.chapter.source_id,
                self.source.resolve_page_urls(
                    &task.series.extension_id,
                    &task.series.source_id,
                    &task.chapter.source_id,
                ),
            )
            .await??;

        if let Some(invalid) = urls.iter().find(|url| !is_http_url(url)) {
            warn!("章节包含不支持的页面地址，跳过整章: {}", invalid);
            return Err(DownloadError::InvalidPageUrl(invalid.clone()));
        }

        debug!("共 {} 页", urls.len());
        Ok(urls)
    }

    async fn prepare_chapter_dir(&self, task: &DownloadTask) -> Result<PathBuf, DownloadError> {
        let dir = self
            .path_resolver
            .chapter_dir(&task.series, &task.chapter, &task.downloads_dir)
            .await?;
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    async fn fetch_page(&self, series: &Series, url: &str) -> Result<Vec<u8>, DownloadError> {
        let result = self
            .with_timeout(
                "拉取图片",
                url,
                self.source.fetch_image(&series.extension_id, series, url),
            )
            .await??;

        match result {
            FetchResult::Bytes(bytes) => Ok(bytes),
            FetchResult::NeedsDirectFetch(direct_url) => {
                debug!("扩展源未返回图片数据，直接请求: {}", direct_url);
                Ok(self.http.get_bytes(&direct_url).await?)
            }
        }
    }

    async fn with_timeout<F, T>(
        &self,
        stage: &'static str,
        target: &str,
        fut: F,
    ) -> Result<T, DownloadError>
    where
        F: Future<Output = T>,
    {
        match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| DownloadError::Timeout {
                    stage,
                    target: target.to_string(),
                }),
            None => Ok(fut.await),
        }
    }

    fn record_error(&self, task: &DownloadTask, error: &DownloadError) {
        let _publish = self.publish.lock();
        let errors = {
            let mut state = self.state.lock();
            state.errors.push(DownloadErrorEntry {
                chapter: task.chapter.clone(),
                series: task.series.clone(),
                error_str: error.to_string(),
            });
            state.errors.clone()
        };
        self.observer.on_errors_changed(&errors);
    }
}
