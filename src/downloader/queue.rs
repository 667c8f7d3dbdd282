use std::collections::VecDeque;

use super::models::DownloadTask;

/// 先进先出的任务队列，同一章节只会出现一次
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    tasks: VecDeque<DownloadTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, chapter_id: &str) -> bool {
        self.tasks.iter().any(|t| t.chapter_id() == chapter_id)
    }

    /// 追加到队尾，已在队列中的章节（以及本批次内重复的章节）会被丢弃，返回实际入队数量
    pub fn extend(&mut self, tasks: impl IntoIterator<Item = DownloadTask>) -> usize {
        let mut added = 0;
        for task in tasks {
            if self.contains(task.chapter_id()) {
                continue;
            }
            self.tasks.push_back(task);
            added += 1;
        }
        added
    }

    pub fn pop_front(&mut self) -> Option<DownloadTask> {
        self.tasks.pop_front()
    }

    // 暂停时把半成品任务放回队首
    pub fn push_front(&mut self, task: DownloadTask) {
        self.tasks.retain(|t| t.chapter_id() != task.chapter_id());
        self.tasks.push_front(task);
    }

    pub fn remove(&mut self, chapter_id: &str) -> Option<DownloadTask> {
        let index = self.tasks.iter().position(|t| t.chapter_id() == chapter_id)?;
        self.tasks.remove(index)
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn to_vec(&self) -> Vec<DownloadTask> {
        self.tasks.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::models::{Chapter, Series};

    fn task(chapter_id: &str, series_id: &str) -> DownloadTask {
        DownloadTask::new(
            Series {
                id: series_id.to_string(),
                extension_id: "ext".to_string(),
                source_id: series_id.to_string(),
                title: series_id.to_string(),
            },
            Chapter {
                id: chapter_id.to_string(),
                source_id: chapter_id.to_string(),
                chapter_number: "1".to_string(),
                title: String::new(),
            },
            "/tmp/downloads",
        )
    }

    fn ids(queue: &TaskQueue) -> Vec<String> {
        queue.to_vec().into_iter().map(|t| t.chapter.id).collect()
    }

    #[test]
    fn test_extend_dedups_by_chapter_id() {
        let mut queue = TaskQueue::new();
        assert_eq!(queue.extend(vec![task("c1", "s1")]), 1);
        // 不同系列、相同章节ID同样视为重复
        assert_eq!(queue.extend(vec![task("c1", "s2")]), 0);
        assert_eq!(queue.extend(vec![task("c2", "s1"), task("c2", "s1")]), 1);
        assert_eq!(ids(&queue), vec!["c1", "c2"]);
    }

    #[test]
    fn test_push_front_keeps_relative_order() {
        let mut queue = TaskQueue::new();
        queue.extend(vec![task("c1", "s"), task("c2", "s"), task("c3", "s")]);

        let mut head = queue.pop_front().unwrap();
        head.page = Some(4);
        queue.push_front(head);

        assert_eq!(ids(&queue), vec!["c1", "c2", "c3"]);
        assert_eq!(queue.to_vec()[0].page, Some(4));
    }

    #[test]
    fn test_push_front_replaces_requeued_duplicate() {
        let mut queue = TaskQueue::new();
        queue.extend(vec![task("c1", "s"), task("c2", "s")]);
        let head = queue.pop_front().unwrap();
        // 处理期间用户又添加了同一章节
        queue.extend(vec![task("c1", "s")]);
        queue.push_front(head);
        assert_eq!(ids(&queue), vec!["c1", "c2"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut queue = TaskQueue::new();
        queue.extend(vec![task("c1", "s"), task("c2", "s")]);
        assert!(queue.remove("c1").is_some());
        assert!(queue.remove("c1").is_none());
        assert_eq!(queue.len(), 1);
        queue.clear();
        assert!(queue.is_empty());
    }
}
