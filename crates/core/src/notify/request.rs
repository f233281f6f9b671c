use crate::notify::error::NotifyError;
use serde::Serialize;
use std::ops::RangeInclusive;
use std::time::Duration;
use url::Url;

/// 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// 请求体编码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    None,
    Json,
    Form,
    Multipart,
    Raw,
}

/// # Summary
/// multipart/form-data 中的单个字段。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartField {
    pub name: String,
    pub value: PartValue,
}

/// multipart 字段值：纯文本或文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        data: Vec<u8>,
    },
}

/// # Summary
/// 请求体。
///
/// # Invariants
/// - `Json` 中保存已序列化的字节，保证发送内容与转换时一致。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Vec<u8>),
    Form(Vec<(String, String)>),
    Multipart(Vec<MultipartField>),
    Raw {
        content_type: Option<String>,
        data: Vec<u8>,
    },
}

impl RequestBody {
    /// 将任意可序列化对象编码为 JSON 请求体
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, NotifyError> {
        serde_json::to_vec(value)
            .map(RequestBody::Json)
            .map_err(|e| NotifyError::Param(format!("failed to encode JSON body: {}", e)))
    }

    pub fn body_type(&self) -> BodyType {
        match self {
            RequestBody::Empty => BodyType::None,
            RequestBody::Json(_) => BodyType::Json,
            RequestBody::Form(_) => BodyType::Form,
            RequestBody::Multipart(_) => BodyType::Multipart,
            RequestBody::Raw { .. } => BodyType::Raw,
        }
    }

    /// JSON 请求体解析为 `serde_json::Value`，其他类型返回 `None`
    pub fn as_json(&self) -> Option<serde_json::Value> {
        match self {
            RequestBody::Json(bytes) => serde_json::from_slice(bytes).ok(),
            _ => None,
        }
    }
}

/// # Summary
/// 与具体 HTTP 库无关的请求描述，由 Transformer 生成、由 `HttpClient` 执行。
///
/// # Invariants
/// - `query` 保持插入顺序，允许同名参数重复出现。
/// - `url` 不包含查询串，查询参数统一放在 `query` 中。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestSpec {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
}

impl HttpRequestSpec {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn body_type(&self) -> BodyType {
        self.body.body_type()
    }

    /// 第一个同名查询参数的值
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// # Summary
    /// 拼装带查询串的完整 URL。
    ///
    /// # Logic
    /// 1. 解析 `url`，失败视为参数错误。
    /// 2. 按顺序追加 `query`，值按 form-urlencoded 规则转义。
    pub fn full_url(&self) -> Result<Url, NotifyError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| NotifyError::Param(format!("invalid request url {}: {}", self.url, e)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}

/// 平台原始响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// 响应体的解析方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseBodyType {
    #[default]
    Json,
    Text,
}

/// 响应字段与期望值的比较方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Equal,
    NotEqual,
    Present,
    Regex,
}

/// # Summary
/// 声明式的成功判定规则。新增平台只需提供一份此配置与一个转换函数。
///
/// # Invariants
/// - `path` 为点分路径，数组下标直接写数字，例如 `result.message_id`、`items.0.id`。
/// - `Regex` 模式下 `expect` 必须是字符串形式的正则表达式。
/// - `ResponseBodyType::Text` 时 `path` 被忽略，整个响应体参与比较。
/// - 落在 `json_error_range` 内的非成功状态码：响应体是合法 JSON 时为平台错误，
///   否则与其他状态码一样视为传输错误。
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseHandlerConfig {
    pub body_type: ResponseBodyType,
    pub check_body: bool,
    pub path: String,
    pub expect: serde_json::Value,
    pub mode: MatchMode,
    pub code_path: Option<String>,
    pub msg_path: Option<String>,
    pub status_range: RangeInclusive<u16>,
    // 平台在这些状态码下仍以 JSON 返回错误详情
    pub json_error_range: Option<RangeInclusive<u16>>,
    // 成功时拷贝到 `SendResult.metadata` 的 (键, 路径)
    pub metadata: Vec<(String, String)>,
}

impl Default for ResponseHandlerConfig {
    fn default() -> Self {
        Self {
            body_type: ResponseBodyType::Json,
            check_body: false,
            path: String::new(),
            expect: serde_json::Value::Null,
            mode: MatchMode::Equal,
            code_path: None,
            msg_path: None,
            status_range: 200..=299,
            json_error_range: None,
            metadata: Vec::new(),
        }
    }
}

impl ResponseHandlerConfig {
    /// 仅检查 HTTP 状态码
    pub fn status_only() -> Self {
        Self::default()
    }

    /// 检查 JSON 字段 `path` 等于 `expect`
    pub fn json_field(path: impl Into<String>, expect: impl Into<serde_json::Value>) -> Self {
        Self {
            check_body: true,
            path: path.into(),
            expect: expect.into(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_body_type(mut self, body_type: ResponseBodyType) -> Self {
        self.body_type = body_type;
        self
    }

    /// 失败时从哪两个字段读取平台错误码与错误信息
    pub fn with_error_paths(mut self, code_path: impl Into<String>, msg_path: impl Into<String>) -> Self {
        self.code_path = Some(code_path.into());
        self.msg_path = Some(msg_path.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.metadata.push((key.into(), path.into()));
        self
    }

    pub fn with_status_range(mut self, range: RangeInclusive<u16>) -> Self {
        self.status_range = range;
        self
    }

    /// 这些状态码下若响应体是 JSON，则从响应体读取平台错误
    pub fn with_json_error_range(mut self, range: RangeInclusive<u16>) -> Self {
        self.json_error_range = Some(range);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_keeps_query_order_and_escapes_values() {
        let spec = HttpRequestSpec::post("https://oapi.dingtalk.com/robot/send")
            .with_query("access_token", "tok")
            .with_query("timestamp", "1700000000000")
            .with_query("sign", "a+b/c=");

        let url = spec.full_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://oapi.dingtalk.com/robot/send?access_token=tok&timestamp=1700000000000&sign=a%2Bb%2Fc%3D"
        );
        assert_eq!(spec.query_value("sign"), Some("a+b/c="));
    }

    #[test]
    fn test_full_url_without_query_has_no_question_mark() {
        let spec = HttpRequestSpec::post("https://api.telegram.org/botbot123:token/sendMessage");
        assert_eq!(
            spec.full_url().unwrap().as_str(),
            "https://api.telegram.org/botbot123:token/sendMessage"
        );
    }

    #[test]
    fn test_invalid_url_is_a_param_error() {
        let spec = HttpRequestSpec::get("not a url");
        assert!(matches!(spec.full_url(), Err(NotifyError::Param(_))));
    }

    #[test]
    fn test_json_body_type() {
        let body = RequestBody::json(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(body.body_type(), BodyType::Json);
        assert_eq!(body.as_json(), Some(serde_json::json!({"a": 1})));
    }
}
