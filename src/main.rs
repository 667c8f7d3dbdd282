use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing::{debug, warn};

use manga_downloader::common::client::client::HttpClient;
use manga_downloader::common::logger::{PrettyLogger, init_tracing};
use manga_downloader::downloader::library::{
    delete_downloaded_chapter, downloaded_pages, is_chapter_downloaded,
};
use manga_downloader::downloader::progress::ConsoleProgress;
use manga_downloader::downloader::{DefaultPathResolver, DownloadTask, Downloader, DownloaderConfig};
use manga_downloader::manifest::{Manifest, ManifestSource};
use manga_downloader::state::QueueState;
use manga_downloader::{log_error, log_info, log_success, log_warning};

mod cli;

/// 过滤掉已经完整下载过的章节
async fn pending_tasks(manifest: &Manifest, tasks: Vec<DownloadTask>) -> anyhow::Result<Vec<DownloadTask>> {
    let mut pending = Vec::with_capacity(tasks.len());
    for task in tasks {
        let (_, chapter) = manifest.find_chapter(&task.chapter.id)?;
        let dir = DefaultPathResolver::resolve(&task.series, &task.chapter, &task.downloads_dir);
        if is_chapter_downloaded(&dir, chapter.pages.len()).await? {
            debug!("已下载，跳过: {}", task.chapter.display_name());
            continue;
        }
        pending.push(task);
    }
    Ok(pending)
}

async fn run_download(args: &cli::DownloadArgs) -> anyhow::Result<()> {
    let manifest = Manifest::load(&args.library.manifest)
        .await
        .with_context(|| format!("无法加载清单 {}", args.library.manifest.display()))?;

    let timeout = (args.timeout > 0).then(|| Duration::from_secs(args.timeout));
    if timeout.is_none() {
        warn!("未设置超时，卡住的请求会阻塞整个队列");
    }

    let http = HttpClient::with_options(timeout, args.user_agent.as_deref())?;
    let downloader = Arc::new(
        Downloader::new(Arc::new(ManifestSource::new(&manifest)), http)
            .with_observer(Arc::new(ConsoleProgress::new()))
            .with_config(DownloaderConfig {
                fetch_timeout: timeout,
            }),
    );

    // 先恢复上次没下完的任务，它们排在最前面
    let state_file = args.library.state_file();
    let previous = QueueState::load(&state_file).await?;
    if !previous.tasks.is_empty() {
        log_info!("恢复 {} 个未完成的任务", previous.tasks.len());
        downloader.add(previous.tasks);
    }

    let tasks = manifest.tasks(
        &args.library.output_dir,
        args.series.as_deref(),
        args.chapter.as_deref(),
    );
    let tasks = if args.redownload {
        tasks
    } else {
        pending_tasks(&manifest, tasks).await?
    };
    downloader.add(tasks);

    let queued = downloader.queue().len();
    if queued == 0 {
        log_success!("没有需要下载的章节");
        return Ok(());
    }
    log_info!("共 {} 个章节待下载，按 Ctrl-C 暂停", queued);

    let ctrl_c = tokio::spawn({
        let downloader = Arc::clone(&downloader);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                downloader.pause();
            }
        }
    });

    downloader.start().await;
    ctrl_c.abort();

    let remaining = downloader.queue();
    QueueState::new(remaining.clone()).save(&state_file).await?;

    let errors = downloader.errors();
    PrettyLogger::separator();
    for entry in &errors {
        log_error!(
            "{} / {}: {}",
            entry.series.title,
            entry.chapter.display_name(),
            entry.error_str
        );
    }

    if !errors.is_empty() {
        return Err(anyhow!("{} 个章节下载失败", errors.len()));
    }

    if remaining.is_empty() {
        PrettyLogger::completion_summary(&[format!("共下载 {} 个章节", queued)]);
    } else {
        log_warning!(
            "已暂停，剩余 {} 个章节，进度已保存到 {}",
            remaining.len(),
            state_file.display()
        );
    }
    Ok(())
}

async fn run_status(args: &cli::LibraryArgs) -> anyhow::Result<()> {
    let manifest = Manifest::load(&args.manifest).await?;

    for (series, chapter) in manifest.chapters() {
        let dir = DefaultPathResolver::resolve(&series.series, &chapter.chapter, &args.output_dir);
        let pages = downloaded_pages(&dir).await?;
        PrettyLogger::chapter_status(
            &series.series.title,
            chapter.chapter.display_name(),
            pages,
            chapter.pages.len(),
        );
    }

    let state = QueueState::load(&args.state_file()).await?;
    if !state.tasks.is_empty() {
        PrettyLogger::separator();
        log_info!("{} 个章节等待继续下载", state.tasks.len());
    }
    Ok(())
}

async fn run_delete(args: &cli::LibraryArgs, chapter_id: &str) -> anyhow::Result<()> {
    let manifest = Manifest::load(&args.manifest).await?;
    let (series, chapter) = manifest.find_chapter(chapter_id)?;
    let dir = DefaultPathResolver::resolve(&series.series, &chapter.chapter, &args.output_dir);

    if delete_downloaded_chapter(&dir, &args.output_dir).await? {
        log_success!("已删除 {}", dir.display());
    } else {
        log_warning!("章节未下载: {}", chapter.chapter.display_name());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_tracing(args.verbose);
    debug!("命令行参数: {:?}", args);

    match &args.command {
        cli::Command::Download(download) => run_download(download).await,
        cli::Command::Status(library) => run_status(library).await,
        cli::Command::Delete { library, chapter } => run_delete(library, chapter).await,
    }
}
