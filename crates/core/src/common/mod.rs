pub mod time;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 通知平台枚举，标识一个 Provider 以及它能处理的消息族。
///
/// # Invariants
/// - 字符串形式与配置文件中的节名保持一致。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    // 钉钉群机器人
    DingTalk,
    // 企业微信群机器人
    WeCom,
    // Telegram Bot
    Telegram,
    // SMTP 邮件
    Email,
}

impl ProviderType {
    /// 返回 Provider 的标签字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::DingTalk => "dingtalk",
            ProviderType::WeCom => "wecom",
            ProviderType::Telegram => "telegram",
            ProviderType::Email => "email",
        }
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dingtalk" => Ok(ProviderType::DingTalk),
            "wecom" | "wecombot" => Ok(ProviderType::WeCom),
            "telegram" => Ok(ProviderType::Telegram),
            "email" | "smtp" => Ok(ProviderType::Email),
            _ => Err(format!("Unknown ProviderType: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
