use std::time::Duration;

use reqwest::{
    Client, ClientBuilder, Response,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::{debug, warn};

use crate::common::client::error::ClientError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";

// 直接拉取图片用的 HTTP 客户端，扩展源无法给出字节时回退到这里
#[derive(Debug, Clone)]
pub struct HttpClient {
    pub inner: Client,
}

impl HttpClient {
    // 默认配置：30 秒超时 + 浏览器 UA
    pub fn new() -> Result<Self, ClientError> {
        Self::with_options(Some(DEFAULT_TIMEOUT), None)
    }

    /// `timeout` 为 `None` 时不设置超时，一个卡住的请求会一直阻塞下载队列
    pub fn with_options(
        timeout: Option<Duration>,
        user_agent: Option<&str>,
    ) -> Result<Self, ClientError> {
        let mut headers = Self::get_default_headers();
        if let Some(ua) = user_agent {
            let value =
                HeaderValue::from_str(ua).map_err(|e| ClientError::InvalidHeader(e.to_string()))?;
            headers.insert(USER_AGENT, value);
        }

        let mut builder = ClientBuilder::new().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/apng,image/*,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"));
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers
    }

    // 下载整张图片
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        debug!("直接请求图片: {}", url);

        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, url))?;

        Self::check_response_status(&resp, url)?;

        let bytes = resp.bytes().await.map_err(|e| Self::map_send_error(e, url))?;
        debug!("图片大小: {} 字节", bytes.len());
        Ok(bytes.to_vec())
    }

    fn map_send_error(error: reqwest::Error, url: &str) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout(url.to_string())
        } else {
            ClientError::Reqwest(error)
        }
    }

    // 检查响应状态
    fn check_response_status(response: &Response, url: &str) -> Result<(), ClientError> {
        let status = response.status();
        debug!("Response Status: {}", status);

        if status.is_success() {
            return Ok(());
        }

        match status {
            reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::TOO_MANY_REQUESTS => {
                warn!("🚫 状态码 {}，可能触发了图源的访问限制", status);
            }
            _ => warn!("❌ 非成功状态码: {}", status),
        }

        Err(ClientError::Status {
            status,
            url: url.to_string(),
        })
    }
}
