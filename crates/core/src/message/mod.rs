//! # 消息模型
//!
//! 各平台的消息均为带标签的枚举，`Message` 将它们汇总为一个和类型，
//! Provider 通过 `provider_type()` 做一次判别式分发。

pub mod dingtalk;
pub mod email;
pub mod telegram;
pub mod wecom;

use crate::common::ProviderType;
use crate::notify::error::NotifyError;

pub use dingtalk::DingTalkMessage;
pub use email::EmailMessage;
pub use telegram::TelegramMessage;
pub use wecom::WeComMessage;

/// # Summary
/// 消息自校验接口。
///
/// # Invariants
/// - 校验是纯 CPU 计算，不得产生任何 I/O。
/// - 失败一律返回 `NotifyError::Param`。
pub trait Validate {
    fn validate(&self) -> Result<(), NotifyError>;
}

/// # Summary
/// 所有平台消息的和类型。
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    DingTalk(DingTalkMessage),
    WeCom(WeComMessage),
    Telegram(TelegramMessage),
    Email(EmailMessage),
}

impl Message {
    /// 消息所属平台
    pub fn provider_type(&self) -> ProviderType {
        match self {
            Message::DingTalk(_) => ProviderType::DingTalk,
            Message::WeCom(_) => ProviderType::WeCom,
            Message::Telegram(_) => ProviderType::Telegram,
            Message::Email(_) => ProviderType::Email,
        }
    }

    /// 平台内的消息类型标签，与线上 `msgtype` 一致
    pub fn msg_type(&self) -> &'static str {
        match self {
            Message::DingTalk(m) => m.msg_type(),
            Message::WeCom(m) => m.msg_type(),
            Message::Telegram(m) => m.msg_type(),
            Message::Email(_) => "email",
        }
    }
}

impl Validate for Message {
    fn validate(&self) -> Result<(), NotifyError> {
        match self {
            Message::DingTalk(m) => m.validate(),
            Message::WeCom(m) => m.validate(),
            Message::Telegram(m) => m.validate(),
            Message::Email(m) => m.validate(),
        }
    }
}

impl From<DingTalkMessage> for Message {
    fn from(m: DingTalkMessage) -> Self {
        Message::DingTalk(m)
    }
}

impl From<WeComMessage> for Message {
    fn from(m: WeComMessage) -> Self {
        Message::WeCom(m)
    }
}

impl From<TelegramMessage> for Message {
    fn from(m: TelegramMessage) -> Self {
        Message::Telegram(m)
    }
}

impl From<EmailMessage> for Message {
    fn from(m: EmailMessage) -> Self {
        Message::Email(m)
    }
}

pub(crate) fn param(msg: impl Into<String>) -> NotifyError {
    NotifyError::Param(msg.into())
}

/// 字段不能为空 (纯空白同样视为空)
pub(crate) fn require(field: &str, value: &str) -> Result<(), NotifyError> {
    if value.trim().is_empty() {
        return Err(param(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// UTF-8 字节长度上限
pub(crate) fn max_bytes(field: &str, value: &str, limit: usize) -> Result<(), NotifyError> {
    if value.len() > limit {
        return Err(param(format!("{} exceeds {} bytes", field, limit)));
    }
    Ok(())
}

/// 字符数上限
pub(crate) fn max_chars(field: &str, value: &str, limit: usize) -> Result<(), NotifyError> {
    if value.chars().count() > limit {
        return Err(param(format!("{} exceeds {} characters", field, limit)));
    }
    Ok(())
}

/// 列表长度区间
pub(crate) fn count_in(field: &str, len: usize, min: usize, max: usize) -> Result<(), NotifyError> {
    if len < min || len > max {
        return Err(param(format!(
            "{} must contain between {} and {} items, got {}",
            field, min, max, len
        )));
    }
    Ok(())
}

/// 含有 `@all` 的提及列表不得再包含具体成员
pub(crate) fn check_mentions(field: &str, list: &[String]) -> Result<(), NotifyError> {
    if list.len() > 1 && list.iter().any(|m| m == "@all") {
        return Err(param(format!(
            "{} cannot mix @all with specific members",
            field
        )));
    }
    Ok(())
}
