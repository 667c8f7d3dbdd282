use std::sync::Arc;

use tokio::sync::watch;

use super::models::{DownloadErrorEntry, DownloadTask, DownloaderSnapshot};

/// 下载器状态的订阅者
///
/// 每次状态变化（包括每写完一页）都会回调，回调在持锁之外执行，
/// 但仍在下载循环里同步调用，不要在这里做耗时操作。
pub trait DownloadObserver: Send + Sync {
    fn on_running_changed(&self, _running: bool) {}
    fn on_queue_changed(&self, _queue: &[DownloadTask]) {}
    fn on_current_changed(&self, _current: Option<&DownloadTask>) {}
    fn on_errors_changed(&self, _errors: &[DownloadErrorEntry]) {}
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl DownloadObserver for NoopObserver {}

/// 把状态汇总成 [`DownloaderSnapshot`] 通过 watch 通道发布
#[derive(Debug)]
pub struct SnapshotObserver {
    sender: watch::Sender<DownloaderSnapshot>,
}

impl SnapshotObserver {
    pub fn new() -> (Self, watch::Receiver<DownloaderSnapshot>) {
        let (sender, receiver) = watch::channel(DownloaderSnapshot::default());
        (Self { sender }, receiver)
    }
}

impl DownloadObserver for SnapshotObserver {
    fn on_running_changed(&self, running: bool) {
        self.sender.send_modify(|s| s.running = running);
    }

    fn on_queue_changed(&self, queue: &[DownloadTask]) {
        self.sender.send_modify(|s| s.queue = queue.to_vec());
    }

    fn on_current_changed(&self, current: Option<&DownloadTask>) {
        self.sender.send_modify(|s| s.current = current.cloned());
    }

    fn on_errors_changed(&self, errors: &[DownloadErrorEntry]) {
        self.sender.send_modify(|s| s.errors = errors.to_vec());
    }
}

// 同时通知多个订阅者
#[derive(Default)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn DownloadObserver>>,
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn DownloadObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl DownloadObserver for FanoutObserver {
    fn on_running_changed(&self, running: bool) {
        self.observers.iter().for_each(|o| o.on_running_changed(running));
    }

    fn on_queue_changed(&self, queue: &[DownloadTask]) {
        self.observers.iter().for_each(|o| o.on_queue_changed(queue));
    }

    fn on_current_changed(&self, current: Option<&DownloadTask>) {
        self.observers.iter().for_each(|o| o.on_current_changed(current));
    }

    fn on_errors_changed(&self, errors: &[DownloadErrorEntry]) {
        self.observers.iter().for_each(|o| o.on_errors_changed(errors));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::models::{Chapter, Series};

    fn task() -> DownloadTask {
        DownloadTask::new(
            Series {
                id: "s1".to_string(),
                extension_id: "ext".to_string(),
                source_id: "s1".to_string(),
                title: "Series".to_string(),
            },
            Chapter {
                id: "c1".to_string(),
                source_id: "c1".to_string(),
                chapter_number: "1".to_string(),
                title: String::new(),
            },
            "/tmp",
        )
    }

    #[test]
    fn test_snapshot_observer_aggregates() {
        let (observer, receiver) = SnapshotObserver::new();
        observer.on_running_changed(true);
        observer.on_queue_changed(&[task()]);
        observer.on_current_changed(Some(&task()));

        let snapshot = receiver.borrow().clone();
        assert!(snapshot.running);
        assert_eq!(snapshot.queue.len(), 1);
        assert_eq!(snapshot.current.map(|t| t.chapter.id), Some("c1".to_string()));
        assert!(snapshot.errors.is_empty());
    }

    #[test]
    fn test_fanout_observer_forwards() {
        let (first, first_rx) = SnapshotObserver::new();
        let (second, second_rx) = SnapshotObserver::new();
        let fanout = FanoutObserver::new()
            .with(Arc::new(first))
            .with(Arc::new(second));

        fanout.on_running_changed(true);
        assert!(first_rx.borrow().running);
        assert!(second_rx.borrow().running);
    }
}
