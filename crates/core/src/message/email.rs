//! 邮件消息。信封与正文在这里描述，MIME 组装交给 SMTP 适配器。

use super::{Validate, param, require};
use crate::notify::error::NotifyError;
use serde::{Deserialize, Serialize};

/// 内存中的附件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAttachment {
    pub file_name: String,
    pub content_type: String,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl EmailAttachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// # Summary
/// 一封邮件。
///
/// # Invariants
/// - `to`/`cc`/`bcc` 合计至少一个收件人。
/// - 所有地址形如 `user@domain` 或 `Name <user@domain>`。
/// - `html == true` 时 `body` 按 HTML 发送，否则为纯文本。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub html: bool,
    #[serde(default)]
    pub attachments: Vec<EmailAttachment>,
}

impl EmailMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn to(mut self, addr: impl Into<String>) -> Self {
        self.to.push(addr.into());
        self
    }

    pub fn cc(mut self, addr: impl Into<String>) -> Self {
        self.cc.push(addr.into());
        self
    }

    pub fn bcc(mut self, addr: impl Into<String>) -> Self {
        self.bcc.push(addr.into());
        self
    }

    pub fn reply_to(mut self, addr: impl Into<String>) -> Self {
        self.reply_to = Some(addr.into());
        self
    }

    pub fn html(mut self) -> Self {
        self.html = true;
        self
    }

    pub fn attach(mut self, attachment: EmailAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// 全部收件人 (to + cc + bcc)
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(String::as_str)
    }
}

impl Validate for EmailMessage {
    fn validate(&self) -> Result<(), NotifyError> {
        if self.recipients().next().is_none() {
            return Err(param("email requires at least one recipient"));
        }
        for addr in self.recipients().chain(self.reply_to.as_deref()) {
            check_address(addr)?;
        }
        require("subject", &self.subject)?;
        for attachment in &self.attachments {
            require("attachment file_name", &attachment.file_name)?;
        }
        Ok(())
    }
}

/// 取出 `Name <addr>` 中的地址部分
fn bare_address(addr: &str) -> &str {
    let addr = addr.trim();
    match (addr.rfind('<'), addr.ends_with('>')) {
        (Some(start), true) => &addr[start + 1..addr.len() - 1],
        _ => addr,
    }
}

fn check_address(addr: &str) -> Result<(), NotifyError> {
    let bare = bare_address(addr);
    let valid = match bare.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !bare.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(param(format!("invalid email address: {}", addr)))
    }
}
