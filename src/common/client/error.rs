use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP 请求失败，状态码: {status}，URL: {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("请求超时: {0}")]
    Timeout(String),

    #[error("无效的请求头: {0}")]
    InvalidHeader(String),
}
