use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;

use super::models::{DownloadErrorEntry, DownloadTask};
use super::observer::DownloadObserver;

struct ChapterBar {
    chapter_id: String,
    bar: ProgressBar,
}

/// 终端进度条，每个章节一条
pub struct ConsoleProgress {
    multi_pb: MultiProgress,
    current: Mutex<Option<ChapterBar>>,
    style: ProgressStyle,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let style = ProgressStyle::with_template(
            "{spinner:.green} {prefix:.bold} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} 页 {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

        Self {
            multi_pb: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            current: Mutex::new(None),
            style,
        }
    }

    fn bar_for(&self, task: &DownloadTask) -> ProgressBar {
        let mut current = self.current.lock();
        if let Some(existing) = current.as_ref() {
            if existing.chapter_id == task.chapter.id {
                return existing.bar.clone();
            }
        }

        if let Some(previous) = current.take() {
            previous.bar.finish();
        }

        let bar = self.multi_pb.add(ProgressBar::new(0));
        bar.set_style(self.style.clone());
        bar.set_prefix(format!("{} {}", task.series.title, task.chapter.display_name()));
        *current = Some(ChapterBar {
            chapter_id: task.chapter.id.clone(),
            bar: bar.clone(),
        });
        bar
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadObserver for ConsoleProgress {
    fn on_current_changed(&self, current: Option<&DownloadTask>) {
        let Some(task) = current else {
            if let Some(last) = self.current.lock().take() {
                last.bar.finish();
            }
            return;
        };

        let bar = self.bar_for(task);
        if let Some(total) = task.total_pages {
            bar.set_length(total as u64);
        }
        // 当前任务的 page 是已写完的页
        if let Some(page) = task.page.filter(|_| task.total_pages.is_some()) {
            bar.set_position(page as u64);
        }
    }

    fn on_errors_changed(&self, errors: &[DownloadErrorEntry]) {
        let Some(last_error) = errors.last() else {
            return;
        };
        let mut current = self.current.lock();
        if current
            .as_ref()
            .is_some_and(|c| c.chapter_id == last_error.chapter.id)
        {
            if let Some(chapter) = current.take() {
                chapter.bar.abandon_with_message("下载失败");
            }
        }
    }
}
