use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::downloader::DownloadTask;

pub const DEFAULT_STATE_FILE: &str = ".mangadl-queue.json";

/// 未完成的下载队列，程序退出后用来续传
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    pub tasks: Vec<DownloadTask>,
}

impl QueueState {
    pub fn new(tasks: Vec<DownloadTask>) -> Self {
        Self { tasks }
    }

    /// 文件不存在时返回空队列
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("没有找到队列状态文件: {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let state: QueueState = serde_json::from_str(&data)?;
        info!("从 {} 恢复 {} 个未完成任务", path.display(), state.tasks.len());
        Ok(state)
    }

    /// 队列为空时删除状态文件
    pub async fn save(&self, path: &Path) -> anyhow::Result<()> {
        if self.tasks.is_empty() {
            return Self::remove(path).await;
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let data = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, data).await?;
        info!("保存 {} 个未完成任务到 {}", self.tasks.len(), path.display());
        Ok(())
    }

    pub async fn remove(path: &Path) -> anyhow::Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
