use thiserror::Error;

use crate::common::client::error::ClientError;

#[derive(Debug, Error)]
pub enum DownloadError {
    // 校验错误：章节里存在非 HTTP(S) 的页面地址，整章拒绝下载
    #[error("不支持的页面地址（仅支持 http/https）: {0}")]
    InvalidPageUrl(String),

    // 传输错误
    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("{stage}超时: {target}")]
    Timeout { stage: &'static str, target: String },

    // 扩展源返回的错误
    #[error("扩展源错误: {0:#}")]
    Source(#[from] anyhow::Error),

    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),
}
