//! 钉钉自定义机器人消息。
//! 字段名与钉钉开放平台文档保持一致，例如 `atMobiles`、`isAtAll`、`btnOrientation`。

use super::{Validate, check_mentions, max_bytes, param, require};
use crate::notify::error::NotifyError;
use serde::{Deserialize, Serialize};

/// 文本消息内容的字节上限
pub const TEXT_MAX_BYTES: usize = 2048;
/// Markdown 消息正文的字节上限
pub const MARKDOWN_MAX_BYTES: usize = 2048;

/// # Summary
/// 钉钉机器人消息，序列化后带有 `msgtype` 标签。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "msgtype")]
pub enum DingTalkMessage {
    #[serde(rename = "text")]
    Text(TextMessage),
    #[serde(rename = "markdown")]
    Markdown(MarkdownMessage),
    #[serde(rename = "link")]
    Link(LinkMessage),
    #[serde(rename = "actionCard")]
    ActionCard(ActionCardMessage),
    #[serde(rename = "feedCard")]
    FeedCard(FeedCardMessage),
}

/// @ 提醒设置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct At {
    #[serde(rename = "atMobiles", default, skip_serializing_if = "Vec::is_empty")]
    pub at_mobiles: Vec<String>,
    #[serde(rename = "atUserIds", default, skip_serializing_if = "Vec::is_empty")]
    pub at_user_ids: Vec<String>,
    #[serde(rename = "isAtAll", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_at_all: bool,
}

impl At {
    pub fn is_empty(&self) -> bool {
        self.at_mobiles.is_empty() && self.at_user_ids.is_empty() && !self.is_at_all
    }

    fn validate(&self) -> Result<(), NotifyError> {
        check_mentions("atMobiles", &self.at_mobiles)?;
        check_mentions("atUserIds", &self.at_user_ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    pub text: TextContent,
    #[serde(default, skip_serializing_if = "At::is_empty")]
    pub at: At,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownContent {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownMessage {
    pub markdown: MarkdownContent,
    #[serde(default, skip_serializing_if = "At::is_empty")]
    pub at: At,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkContent {
    pub title: String,
    pub text: String,
    #[serde(rename = "messageUrl")]
    pub message_url: String,
    #[serde(rename = "picUrl", default, skip_serializing_if = "String::is_empty")]
    pub pic_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMessage {
    pub link: LinkContent,
}

/// ActionCard 的独立跳转按钮
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionButton {
    pub title: String,
    #[serde(rename = "actionURL")]
    pub action_url: String,
}

/// # Summary
/// ActionCard 内容。
///
/// # Invariants
/// - 整体跳转 (`singleTitle` + `singleURL`) 与独立按钮 (`btns`) 必须且只能二选一。
/// - `btnOrientation` 为字符串 `"0"` (竖排) 或 `"1"` (横排)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCardContent {
    pub title: String,
    pub text: String,
    #[serde(rename = "btnOrientation", default, skip_serializing_if = "String::is_empty")]
    pub btn_orientation: String,
    #[serde(rename = "singleTitle", default, skip_serializing_if = "Option::is_none")]
    pub single_title: Option<String>,
    #[serde(rename = "singleURL", default, skip_serializing_if = "Option::is_none")]
    pub single_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub btns: Vec<ActionButton>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCardMessage {
    #[serde(rename = "actionCard")]
    pub action_card: ActionCardContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedLink {
    pub title: String,
    #[serde(rename = "messageURL")]
    pub message_url: String,
    #[serde(rename = "picURL")]
    pub pic_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCardContent {
    pub links: Vec<FeedLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCardMessage {
    #[serde(rename = "feedCard")]
    pub feed_card: FeedCardContent,
}

impl DingTalkMessage {
    pub fn text(content: impl Into<String>) -> Self {
        DingTalkMessage::Text(TextMessage {
            text: TextContent {
                content: content.into(),
            },
            at: At::default(),
        })
    }

    pub fn markdown(title: impl Into<String>, text: impl Into<String>) -> Self {
        DingTalkMessage::Markdown(MarkdownMessage {
            markdown: MarkdownContent {
                title: title.into(),
                text: text.into(),
            },
            at: At::default(),
        })
    }

    pub fn link(
        title: impl Into<String>,
        text: impl Into<String>,
        message_url: impl Into<String>,
    ) -> Self {
        DingTalkMessage::Link(LinkMessage {
            link: LinkContent {
                title: title.into(),
                text: text.into(),
                message_url: message_url.into(),
                pic_url: String::new(),
            },
        })
    }

    pub fn action_card(content: ActionCardContent) -> Self {
        DingTalkMessage::ActionCard(ActionCardMessage {
            action_card: content,
        })
    }

    pub fn feed_card(links: Vec<FeedLink>) -> Self {
        DingTalkMessage::FeedCard(FeedCardMessage {
            feed_card: FeedCardContent { links },
        })
    }

    /// 为 text / markdown 消息设置 @ 提醒，其他类型忽略
    pub fn with_at(mut self, at: At) -> Self {
        match &mut self {
            DingTalkMessage::Text(m) => m.at = at,
            DingTalkMessage::Markdown(m) => m.at = at,
            _ => {}
        }
        self
    }

    pub fn msg_type(&self) -> &'static str {
        match self {
            DingTalkMessage::Text(_) => "text",
            DingTalkMessage::Markdown(_) => "markdown",
            DingTalkMessage::Link(_) => "link",
            DingTalkMessage::ActionCard(_) => "actionCard",
            DingTalkMessage::FeedCard(_) => "feedCard",
        }
    }
}

impl Validate for DingTalkMessage {
    fn validate(&self) -> Result<(), NotifyError> {
        match self {
            DingTalkMessage::Text(m) => {
                require("text content", &m.text.content)?;
                max_bytes("text content", &m.text.content, TEXT_MAX_BYTES)?;
                m.at.validate()
            }
            DingTalkMessage::Markdown(m) => {
                require("markdown title", &m.markdown.title)?;
                require("markdown text", &m.markdown.text)?;
                max_bytes("markdown text", &m.markdown.text, MARKDOWN_MAX_BYTES)?;
                m.at.validate()
            }
            DingTalkMessage::Link(m) => {
                require("link title", &m.link.title)?;
                require("link text", &m.link.text)?;
                require("link messageUrl", &m.link.message_url)
            }
            DingTalkMessage::ActionCard(m) => m.action_card.validate(),
            DingTalkMessage::FeedCard(m) => {
                if m.feed_card.links.is_empty() {
                    return Err(param("feedCard links cannot be empty"));
                }
                for link in &m.feed_card.links {
                    require("feedCard link title", &link.title)?;
                    require("feedCard link messageURL", &link.message_url)?;
                    require("feedCard link picURL", &link.pic_url)?;
                }
                Ok(())
            }
        }
    }
}

impl ActionCardContent {
    /// 整体跳转卡片
    pub fn single(
        title: impl Into<String>,
        text: impl Into<String>,
        single_title: impl Into<String>,
        single_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            btn_orientation: String::new(),
            single_title: Some(single_title.into()),
            single_url: Some(single_url.into()),
            btns: Vec::new(),
        }
    }

    /// 独立跳转卡片
    pub fn buttons(title: impl Into<String>, text: impl Into<String>, btns: Vec<ActionButton>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            btn_orientation: String::new(),
            single_title: None,
            single_url: None,
            btns,
        }
    }

    pub fn with_orientation(mut self, orientation: impl Into<String>) -> Self {
        self.btn_orientation = orientation.into();
        self
    }

    fn validate(&self) -> Result<(), NotifyError> {
        require("actionCard title", &self.title)?;
        require("actionCard text", &self.text)?;

        if !self.btn_orientation.is_empty() && !matches!(self.btn_orientation.as_str(), "0" | "1") {
            return Err(param("actionCard btnOrientation must be \"0\" or \"1\""));
        }

        let single = self.single_title.is_some() || self.single_url.is_some();
        let multiple = !self.btns.is_empty();
        match (single, multiple) {
            (true, true) => Err(param(
                "actionCard cannot set both singleTitle/singleURL and btns",
            )),
            (false, false) => Err(param(
                "actionCard requires either singleTitle/singleURL or btns",
            )),
            (true, false) => {
                require("actionCard singleTitle", self.single_title.as_deref().unwrap_or_default())?;
                require("actionCard singleURL", self.single_url.as_deref().unwrap_or_default())
            }
            (false, true) => {
                for btn in &self.btns {
                    require("actionCard button title", &btn.title)?;
                    require("actionCard button actionURL", &btn.action_url)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_wire_format() {
        let msg = DingTalkMessage::text("hello").with_at(At {
            at_mobiles: vec!["13800000000".to_string()],
            at_user_ids: vec![],
            is_at_all: false,
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "msgtype": "text",
                "text": {"content": "hello"},
                "at": {"atMobiles": ["13800000000"]}
            })
        );
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_text_byte_cap() {
        assert!(DingTalkMessage::text("a".repeat(2048)).validate().is_ok());
        let err = DingTalkMessage::text("a".repeat(2049)).validate().unwrap_err();
        assert_eq!(err.to_string(), "Parameter error: text content exceeds 2048 bytes");
    }

    #[test]
    fn test_markdown_requires_title() {
        assert!(DingTalkMessage::markdown("", "body").validate().is_err());
        assert!(DingTalkMessage::markdown("t", "x".repeat(2049)).validate().is_err());
        assert!(DingTalkMessage::markdown("t", "# body").validate().is_ok());
    }

    #[test]
    fn test_action_card_exclusivity() {
        let single = ActionCardContent::single("t", "x", "Read", "https://example.com");
        assert!(DingTalkMessage::action_card(single.clone()).validate().is_ok());

        let mut both = single.clone();
        both.btns.push(ActionButton {
            title: "b".to_string(),
            action_url: "https://example.com/b".to_string(),
        });
        assert!(DingTalkMessage::action_card(both).validate().is_err());

        let neither = ActionCardContent::buttons("t", "x", vec![]);
        assert!(DingTalkMessage::action_card(neither).validate().is_err());
    }

    #[test]
    fn test_action_card_orientation_is_string_enum() {
        let card = ActionCardContent::buttons(
            "t",
            "x",
            vec![ActionButton {
                title: "ok".to_string(),
                action_url: "https://example.com".to_string(),
            }],
        );
        let horizontal = DingTalkMessage::action_card(card.clone().with_orientation("1"));
        assert!(horizontal.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&horizontal).unwrap()["actionCard"]["btnOrientation"],
            json!("1")
        );
        assert!(
            DingTalkMessage::action_card(card.with_orientation("2"))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_feed_card_requires_links() {
        assert!(DingTalkMessage::feed_card(vec![]).validate().is_err());
        let msg = DingTalkMessage::feed_card(vec![FeedLink {
            title: "t".to_string(),
            message_url: "https://example.com".to_string(),
            pic_url: "https://example.com/p.png".to_string(),
        }]);
        assert!(msg.validate().is_ok());
        assert_eq!(serde_json::to_value(&msg).unwrap()["msgtype"], json!("feedCard"));
    }

    #[test]
    fn test_at_all_cannot_mix_with_user_ids() {
        let msg = DingTalkMessage::text("hi").with_at(At {
            at_mobiles: vec![],
            at_user_ids: vec!["@all".to_string(), "u1".to_string()],
            is_at_all: false,
        });
        assert!(msg.validate().is_err());
    }
}
