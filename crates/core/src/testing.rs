//! 测试替身。通过 `test-utils` feature 暴露给下游 crate 的测试代码。

use crate::notify::error::NotifyError;
use crate::notify::port::HttpClient;
use crate::notify::request::{HttpRequestSpec, HttpResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// # Summary
/// 记录每一次请求并按顺序回放预设响应的 `HttpClient`。
///
/// # Logic
/// 1. 请求被完整克隆进记录列表，可在断言中检查 URL、查询参数与请求体。
/// 2. 预设队列为空时返回 `fallback` (默认 `200 {}`)。
pub struct RecordingHttpClient {
    requests: Mutex<Vec<HttpRequestSpec>>,
    responses: Mutex<VecDeque<Result<HttpResponse, NotifyError>>>,
    fallback: HttpResponse,
}

impl Default for RecordingHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHttpClient {
    pub fn new() -> Self {
        Self::with_fallback(HttpResponse::new(200, "{}"))
    }

    pub fn with_fallback(fallback: HttpResponse) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    /// 追加一条预设响应
    pub fn push_response(&self, response: HttpResponse) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(response));
        self
    }

    /// 追加一条状态码 200 的 JSON 响应
    pub fn push_json(&self, body: serde_json::Value) -> &Self {
        self.push_response(HttpResponse::new(200, body.to_string()))
    }

    /// 追加一次传输失败
    pub fn push_error(&self, err: NotifyError) -> &Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(err));
        self
    }

    /// 已记录的请求快照
    pub fn requests(&self) -> Vec<HttpRequestSpec> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl HttpClient for RecordingHttpClient {
    async fn execute(&self, request: HttpRequestSpec) -> Result<HttpResponse, NotifyError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_and_replays_in_order() {
        let client = RecordingHttpClient::new();
        client.push_json(json!({"n": 1})).push_response(HttpResponse::new(500, "boom"));

        let first = client.execute(HttpRequestSpec::post("http://a/1")).await.unwrap();
        let second = client.execute(HttpRequestSpec::post("http://a/2")).await.unwrap();
        let third = client.execute(HttpRequestSpec::get("http://a/3")).await.unwrap();

        assert_eq!(first.body, br#"{"n":1}"#);
        assert_eq!(second.status, 500);
        assert_eq!(third.body, b"{}");
        assert_eq!(client.request_count(), 3);
        assert_eq!(client.requests()[2].url, "http://a/3");
    }

    #[tokio::test]
    async fn test_replays_errors() {
        let client = RecordingHttpClient::new();
        client.push_error(NotifyError::Network("reset".into()));
        assert!(matches!(
            client.execute(HttpRequestSpec::post("http://a")).await,
            Err(NotifyError::Network(_))
        ));
    }
}
