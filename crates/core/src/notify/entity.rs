use crate::notify::port::HttpClient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

fn default_weight() -> u32 {
    1
}

/// # Summary
/// 账号凭据三元组。
///
/// # Invariants
/// - `key` 为 Webhook Key / Access Token / Bot Token / SMTP 用户名。
/// - `secret` 为可选的签名密钥 (钉钉加签) 或 SMTP 密码。
/// - `app_id` 预留给需要应用 ID 的平台。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

/// # Summary
/// 可发送消息的身份，账号池中的一个成员。
///
/// # Invariants
/// - `name` 在同一账号池内唯一。
/// - `weight` 为正整数，缺省为 1；为 0 时由选择器按 1 处理并告警。
/// - Provider 构造后不可变。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    // 账号名
    pub name: String,
    // 加权随机策略下的权重
    #[serde(default = "default_weight")]
    pub weight: u32,
    // 是否禁用
    #[serde(default)]
    pub disabled: bool,
    // 凭据
    #[serde(default)]
    pub credentials: Credentials,
    // 平台相关的子类型 (例如区分同一平台下的不同机器人类型)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
}

impl Account {
    /// 使用账号名与主凭据创建一个启用状态、权重为 1 的账号
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: 1,
            disabled: false,
            credentials: Credentials {
                key: key.into(),
                secret: None,
                app_id: None,
            },
            sub_type: None,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.credentials.secret = Some(secret.into());
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.credentials.app_id = Some(app_id.into());
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// 非空的签名密钥
    pub fn secret(&self) -> Option<&str> {
        self.credentials
            .secret
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

/// # Summary
/// SMTP 账号：通用账号之外再携带服务器地址与发件人。
///
/// # Invariants
/// - `account.credentials.key` 为 SMTP 用户名，`secret` 为密码；二者均为空时不做认证。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailAccount {
    #[serde(flatten)]
    pub account: Account,
    // SMTP 服务器地址
    pub host: String,
    // SMTP 端口，决定 TLS 策略
    pub port: u16,
    // 发件人地址
    pub from: String,
}

impl EmailAccount {
    pub fn new(account: Account, host: impl Into<String>, port: u16, from: impl Into<String>) -> Self {
        Self {
            account,
            host: host.into(),
            port,
            from: from.into(),
        }
    }
}

/// # Summary
/// 选择器可操作的账号抽象。
///
/// # Invariants
/// - 同一账号池内 `name` 唯一。
pub trait Selectable: Send + Sync {
    fn name(&self) -> &str;
    fn weight(&self) -> u32;
    fn is_enabled(&self) -> bool;
}

impl Selectable for Account {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self) -> u32 {
        self.weight
    }

    fn is_enabled(&self) -> bool {
        !self.disabled
    }
}

impl Selectable for EmailAccount {
    fn name(&self) -> &str {
        &self.account.name
    }

    fn weight(&self) -> u32 {
        self.account.weight
    }

    fn is_enabled(&self) -> bool {
        !self.account.disabled
    }
}

/// # Summary
/// 一次成功发送的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendResult {
    // HTTP 状态码 (邮件为 SMTP 应答码)
    pub status_code: u16,
    // 原始响应体
    pub raw_body: Vec<u8>,
    // 从响应中提取的附加信息，例如 `message_id`、`media_id`
    pub metadata: HashMap<String, String>,
}

impl SendResult {
    /// 以 UTF-8 (有损) 解读响应体
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.raw_body).into_owned()
    }
}

/// # Summary
/// 单次发送的调用上下文。
///
/// # Invariants
/// - `account` 指定时优先于任何选号策略。
/// - `cancel` 被取消后，尚未发出的请求不会再发出。
#[derive(Debug, Clone, Default)]
pub struct SendContext {
    account: Option<String>,
    cancel: CancellationToken,
}

impl SendContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定本次发送使用的账号名
    pub fn with_account(mut self, name: impl Into<String>) -> Self {
        self.account = Some(name.into());
        self
    }

    /// 挂载外部的取消令牌
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// 在令牌被取消时完成的 Future
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

/// # Summary
/// 单次发送的可选项。
#[derive(Clone, Default)]
pub struct SendOptions {
    // 覆盖 Provider 默认的 HTTP 客户端
    pub http_client: Option<Arc<dyn HttpClient>>,
}

impl SendOptions {
    pub fn with_http_client(client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client: Some(client),
        }
    }
}

impl std::fmt::Debug for SendOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendOptions")
            .field("http_client", &self.http_client.as_ref().map(|_| "<custom>"))
            .finish()
    }
}
