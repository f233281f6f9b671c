//! 企业微信群机器人消息。
//!
//! `file` / `voice` 消息引用平台分配的 `media_id`，该 ID 只对上传它的机器人 Key 有效，三天过期。
//! 仅持有 `local_path` 的消息在发送时先上传再回填。

use super::{Validate, check_mentions, count_in, max_bytes, max_chars, param, require};
use crate::notify::error::NotifyError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const TEXT_MAX_BYTES: usize = 2048;
pub const MARKDOWN_MAX_CHARS: usize = 4096;
/// 图片原始数据上限 2 MiB
pub const IMAGE_MAX_BYTES: usize = 2 * 1024 * 1024;
pub const NEWS_MIN_ARTICLES: usize = 1;
pub const NEWS_MAX_ARTICLES: usize = 8;
pub const MAIN_TITLE_MAX_BYTES: usize = 26;
pub const MAIN_DESC_MAX_BYTES: usize = 30;
pub const SOURCE_DESC_MAX_BYTES: usize = 13;
pub const SUB_TITLE_MAX_BYTES: usize = 4096;
pub const HORIZONTAL_CONTENT_MAX: usize = 6;
pub const JUMP_LIST_MAX: usize = 5;
pub const VERTICAL_CONTENT_MAX: usize = 4;

/// # Summary
/// 企业微信机器人消息，序列化后带有 `msgtype` 标签，内容键与标签同名。
///
/// # Invariants
/// - `MarkdownV2` 与 `Markdown` 内容结构相同，仅信封键从 `markdown` 换为 `markdown_v2`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msgtype", rename_all = "snake_case")]
pub enum WeComMessage {
    Text { text: TextContent },
    Markdown { markdown: MarkdownContent },
    MarkdownV2 { markdown_v2: MarkdownContent },
    Image { image: ImageContent },
    News { news: NewsContent },
    File { file: MediaContent },
    Voice { voice: MediaContent },
    TemplateCard { template_card: TemplateCard },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    // 成员 userid 列表，`@all` 提醒所有人
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentioned_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentioned_mobile_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownContent {
    pub content: String,
}

/// 图片内容：base64 编码的原始数据与原始数据的 MD5
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContent {
    pub base64: String,
    pub md5: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub picurl: String,
}

impl Article {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            url: url.into(),
            picurl: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsContent {
    pub articles: Vec<Article>,
}

/// # Summary
/// 文件 / 语音内容。
///
/// # Invariants
/// - `local_path` 不参与序列化，只用于发送前上传。
/// - `media_id` 与 `local_path` 至少存在其一。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaContent {
    #[serde(default)]
    pub media_id: String,
    #[serde(skip)]
    pub local_path: Option<PathBuf>,
}

/// 需要上传的媒体种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    File,
    Voice,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::File => "file",
            MediaKind::Voice => "voice",
        }
    }
}

impl WeComMessage {
    pub fn text(content: impl Into<String>) -> Self {
        WeComMessage::Text {
            text: TextContent {
                content: content.into(),
                ..TextContent::default()
            },
        }
    }

    /// 带 @ 提醒的文本消息
    pub fn text_with_mentions(
        content: impl Into<String>,
        mentioned_list: Vec<String>,
        mentioned_mobile_list: Vec<String>,
    ) -> Self {
        WeComMessage::Text {
            text: TextContent {
                content: content.into(),
                mentioned_list,
                mentioned_mobile_list,
            },
        }
    }

    pub fn markdown(content: impl Into<String>) -> Self {
        WeComMessage::Markdown {
            markdown: MarkdownContent {
                content: content.into(),
            },
        }
    }

    pub fn markdown_v2(content: impl Into<String>) -> Self {
        WeComMessage::MarkdownV2 {
            markdown_v2: MarkdownContent {
                content: content.into(),
            },
        }
    }

    /// 由已编码的 base64 与 MD5 构造图片消息
    pub fn image(base64: impl Into<String>, md5: impl Into<String>) -> Self {
        WeComMessage::Image {
            image: ImageContent {
                base64: base64.into(),
                md5: md5.into(),
            },
        }
    }

    pub fn news(articles: Vec<Article>) -> Self {
        WeComMessage::News {
            news: NewsContent { articles },
        }
    }

    /// 引用已上传文件的文件消息
    pub fn file(media_id: impl Into<String>) -> Self {
        WeComMessage::File {
            file: MediaContent {
                media_id: media_id.into(),
                local_path: None,
            },
        }
    }

    /// 发送时自动上传本地文件的文件消息
    pub fn file_from_path(path: impl Into<PathBuf>) -> Self {
        WeComMessage::File {
            file: MediaContent {
                media_id: String::new(),
                local_path: Some(path.into()),
            },
        }
    }

    pub fn voice(media_id: impl Into<String>) -> Self {
        WeComMessage::Voice {
            voice: MediaContent {
                media_id: media_id.into(),
                local_path: None,
            },
        }
    }

    pub fn voice_from_path(path: impl Into<PathBuf>) -> Self {
        WeComMessage::Voice {
            voice: MediaContent {
                media_id: String::new(),
                local_path: Some(path.into()),
            },
        }
    }

    pub fn template_card(card: TemplateCard) -> Self {
        WeComMessage::TemplateCard {
            template_card: card,
        }
    }

    pub fn msg_type(&self) -> &'static str {
        match self {
            WeComMessage::Text { .. } => "text",
            WeComMessage::Markdown { .. } => "markdown",
            WeComMessage::MarkdownV2 { .. } => "markdown_v2",
            WeComMessage::Image { .. } => "image",
            WeComMessage::News { .. } => "news",
            WeComMessage::File { .. } => "file",
            WeComMessage::Voice { .. } => "voice",
            WeComMessage::TemplateCard { .. } => "template_card",
        }
    }

    /// 文件 / 语音消息的媒体内容
    pub fn media(&self) -> Option<(MediaKind, &MediaContent)> {
        match self {
            WeComMessage::File { file } => Some((MediaKind::File, file)),
            WeComMessage::Voice { voice } => Some((MediaKind::Voice, voice)),
            _ => None,
        }
    }

    pub fn media_mut(&mut self) -> Option<(MediaKind, &mut MediaContent)> {
        match self {
            WeComMessage::File { file } => Some((MediaKind::File, file)),
            WeComMessage::Voice { voice } => Some((MediaKind::Voice, voice)),
            _ => None,
        }
    }

    /// 尚未上传、需要在发送前上传的本地文件
    pub fn pending_upload(&self) -> Option<(MediaKind, &Path)> {
        let (kind, media) = self.media()?;
        if !media.media_id.is_empty() {
            return None;
        }
        media.local_path.as_deref().map(|p| (kind, p))
    }

    /// 回填上传得到的 `media_id`，非媒体消息返回 false
    pub fn set_media_id(&mut self, media_id: impl Into<String>) -> bool {
        match self.media_mut() {
            Some((_, media)) => {
                media.media_id = media_id.into();
                true
            }
            None => false,
        }
    }
}

impl Validate for WeComMessage {
    fn validate(&self) -> Result<(), NotifyError> {
        match self {
            WeComMessage::Text { text } => {
                require("text content", &text.content)?;
                max_bytes("text content", &text.content, TEXT_MAX_BYTES)?;
                check_mentions("mentioned_list", &text.mentioned_list)?;
                check_mentions("mentioned_mobile_list", &text.mentioned_mobile_list)
            }
            WeComMessage::Markdown { markdown } | WeComMessage::MarkdownV2 { markdown_v2: markdown } => {
                require("markdown content", &markdown.content)?;
                max_chars("markdown content", &markdown.content, MARKDOWN_MAX_CHARS)
            }
            WeComMessage::Image { image } => image.validate(),
            WeComMessage::News { news } => {
                count_in("news articles", news.articles.len(), NEWS_MIN_ARTICLES, NEWS_MAX_ARTICLES)?;
                for article in &news.articles {
                    require("article title", &article.title)?;
                    require("article url", &article.url)?;
                }
                Ok(())
            }
            WeComMessage::File { file: media } | WeComMessage::Voice { voice: media } => {
                if media.media_id.is_empty() && media.local_path.is_none() {
                    return Err(param(format!(
                        "{} message requires media_id or local_path",
                        self.msg_type()
                    )));
                }
                Ok(())
            }
            WeComMessage::TemplateCard { template_card } => template_card.validate(),
        }
    }
}

impl ImageContent {
    /// base64 文本对应的原始字节数 (不解码)
    pub fn decoded_len(&self) -> usize {
        let trimmed = self.base64.trim_end_matches('=');
        trimmed.len() * 3 / 4
    }

    fn validate(&self) -> Result<(), NotifyError> {
        require("image base64", &self.base64)?;
        if self.md5.len() != 32 || !self.md5.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(param("image md5 must be 32 hexadecimal characters"));
        }
        if self.decoded_len() > IMAGE_MAX_BYTES {
            return Err(param(format!("image exceeds {} bytes", IMAGE_MAX_BYTES)));
        }
        Ok(())
    }
}

/// 模板卡片类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    TextNotice,
    NewsNotice,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSource {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    // 0 灰色，1 黑色，2 红色，3 绿色
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc_color: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainTitle {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmphasisContent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
}

/// 跳转目标：type 1 为网页，type 2 为小程序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteArea {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub appid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pagepath: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub quote_text: String,
}

/// 二级标题 + 文本列表项：type 1 网页，type 2 附件，type 3 成员详情
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizontalContent {
    pub keyname: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub media_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub userid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jump {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub appid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pagepath: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardAction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub appid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pagepath: String,
}

impl CardAction {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            kind: 1,
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn mini_program(appid: impl Into<String>, pagepath: impl Into<String>) -> Self {
        Self {
            kind: 2,
            appid: appid.into(),
            pagepath: pagepath.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTextArea {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub appid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pagepath: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerticalContent {
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
}

/// # Summary
/// 模板卡片 (`text_notice` 文本通知 / `news_notice` 图文展示)。
///
/// # Invariants
/// - `sub_title_text`、`emphasis_content` 仅用于 text_notice。
/// - `card_image`、`image_text_area`、`vertical_content_list` 仅用于 news_notice，且 news_notice 必须带 `card_image`。
/// - `card_action` 必填。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateCard {
    pub card_type: CardType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<CardSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_title: Option<MainTitle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emphasis_content: Option<EmphasisContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_area: Option<QuoteArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_title_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub horizontal_content_list: Vec<HorizontalContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jump_list: Vec<Jump>,
    pub card_action: CardAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_image: Option<CardImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_text_area: Option<ImageTextArea>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertical_content_list: Vec<VerticalContent>,
}

impl TemplateCard {
    pub fn text_notice(main_title: MainTitle, card_action: CardAction) -> Self {
        Self::new(CardType::TextNotice, main_title, card_action)
    }

    pub fn news_notice(main_title: MainTitle, card_image: CardImage, card_action: CardAction) -> Self {
        let mut card = Self::new(CardType::NewsNotice, main_title, card_action);
        card.card_image = Some(card_image);
        card
    }

    fn new(card_type: CardType, main_title: MainTitle, card_action: CardAction) -> Self {
        Self {
            card_type,
            source: None,
            main_title: Some(main_title),
            emphasis_content: None,
            quote_area: None,
            sub_title_text: None,
            horizontal_content_list: Vec::new(),
            jump_list: Vec::new(),
            card_action,
            card_image: None,
            image_text_area: None,
            vertical_content_list: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), NotifyError> {
        let text_notice = self.card_type == CardType::TextNotice;

        if let Some(source) = &self.source {
            max_bytes("source.desc", &source.desc, SOURCE_DESC_MAX_BYTES)?;
            if source.desc_color.is_some_and(|c| c > 3) {
                return Err(param("source.desc_color must be between 0 and 3"));
            }
        }

        match &self.main_title {
            Some(main) => {
                max_bytes("main_title.title", &main.title, MAIN_TITLE_MAX_BYTES)?;
                max_bytes("main_title.desc", &main.desc, MAIN_DESC_MAX_BYTES)?;
                if main.title.is_empty() && main.desc.is_empty() && !text_notice {
                    return Err(param("news_notice requires main_title.title"));
                }
            }
            None if !text_notice => return Err(param("news_notice requires main_title")),
            None => {}
        }

        if text_notice {
            let has_title = self
                .main_title
                .as_ref()
                .is_some_and(|m| !m.title.trim().is_empty());
            let has_sub = self
                .sub_title_text
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty());
            if !has_title && !has_sub {
                return Err(param(
                    "text_notice requires main_title.title or sub_title_text",
                ));
            }
            if self.card_image.is_some() {
                return Err(param("card_image is only allowed for news_notice"));
            }
            if self.image_text_area.is_some() {
                return Err(param("image_text_area is only allowed for news_notice"));
            }
            if !self.vertical_content_list.is_empty() {
                return Err(param("vertical_content_list is only allowed for news_notice"));
            }
        } else {
            if self.sub_title_text.is_some() {
                return Err(param("sub_title_text is only allowed for text_notice"));
            }
            if self.emphasis_content.is_some() {
                return Err(param("emphasis_content is only allowed for text_notice"));
            }
            match &self.card_image {
                Some(image) => require("card_image.url", &image.url)?,
                None => return Err(param("news_notice requires card_image")),
            }
            if let Some(area) = &self.image_text_area {
                require("image_text_area.image_url", &area.image_url)?;
                check_target("image_text_area", area.kind, &area.url, &area.appid, &area.pagepath)?;
            }
            count_in(
                "vertical_content_list",
                self.vertical_content_list.len(),
                0,
                VERTICAL_CONTENT_MAX,
            )?;
            for item in &self.vertical_content_list {
                require("vertical_content_list title", &item.title)?;
            }
        }

        if let Some(sub) = &self.sub_title_text {
            max_bytes("sub_title_text", sub, SUB_TITLE_MAX_BYTES)?;
        }

        if let Some(quote) = &self.quote_area {
            check_target("quote_area", quote.kind, &quote.url, &quote.appid, &quote.pagepath)?;
        }

        count_in(
            "horizontal_content_list",
            self.horizontal_content_list.len(),
            0,
            HORIZONTAL_CONTENT_MAX,
        )?;
        for item in &self.horizontal_content_list {
            require("horizontal_content_list keyname", &item.keyname)?;
            match item.kind {
                Some(1) => require("horizontal_content_list url", &item.url)?,
                Some(2) => require("horizontal_content_list media_id", &item.media_id)?,
                Some(3) => require("horizontal_content_list userid", &item.userid)?,
                Some(other) if other != 0 => {
                    return Err(param(format!(
                        "horizontal_content_list type {} is not supported",
                        other
                    )));
                }
                _ => {}
            }
        }

        count_in("jump_list", self.jump_list.len(), 0, JUMP_LIST_MAX)?;
        for jump in &self.jump_list {
            require("jump_list title", &jump.title)?;
            check_target("jump_list", jump.kind, &jump.url, &jump.appid, &jump.pagepath)?;
        }

        if !matches!(self.card_action.kind, 1 | 2) {
            return Err(param("card_action type must be 1 (url) or 2 (mini program)"));
        }
        check_target(
            "card_action",
            Some(self.card_action.kind),
            &self.card_action.url,
            &self.card_action.appid,
            &self.card_action.pagepath,
        )
    }
}

/// type 1 需要 url，type 2 需要 appid 与 pagepath
fn check_target(
    field: &str,
    kind: Option<u8>,
    url: &str,
    appid: &str,
    pagepath: &str,
) -> Result<(), NotifyError> {
    match kind {
        Some(1) => require(&format!("{} url", field), url),
        Some(2) => {
            require(&format!("{} appid", field), appid)?;
            require(&format!("{} pagepath", field), pagepath)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_card() -> TemplateCard {
        TemplateCard::text_notice(
            MainTitle {
                title: "Deploy".to_string(),
                desc: "prod".to_string(),
            },
            CardAction::url("https://example.com"),
        )
    }

    #[test]
    fn test_markdown_v2_swaps_envelope_key() {
        let v1 = serde_json::to_value(WeComMessage::markdown("**hi**")).unwrap();
        let v2 = serde_json::to_value(WeComMessage::markdown_v2("**hi**")).unwrap();

        assert_eq!(v1, json!({"msgtype": "markdown", "markdown": {"content": "**hi**"}}));
        assert_eq!(v2["markdown_v2"], v1["markdown"]);
        assert!(v2.get("markdown").is_none());
        assert_eq!(v2["msgtype"], json!("markdown_v2"));
    }

    #[test]
    fn test_markdown_char_cap() {
        assert!(WeComMessage::markdown("字".repeat(4096)).validate().is_ok());
        let err = WeComMessage::markdown("a".repeat(4097)).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter error: markdown content exceeds 4096 characters"
        );
        assert!(WeComMessage::markdown_v2("a".repeat(4097)).validate().is_err());
    }

    #[test]
    fn test_text_byte_cap_and_mentions() {
        assert!(WeComMessage::text("a".repeat(2049)).validate().is_err());
        let ok = WeComMessage::text_with_mentions("hi", vec!["@all".to_string()], vec![]);
        assert!(ok.validate().is_ok());
        let mixed = WeComMessage::text_with_mentions(
            "hi",
            vec!["@all".to_string(), "zhangsan".to_string()],
            vec![],
        );
        assert!(mixed.validate().is_err());
    }

    #[test]
    fn test_news_article_bounds() {
        assert!(WeComMessage::news(vec![]).validate().is_err());
        let nine = (0..9)
            .map(|i| Article::new(format!("t{}", i), "https://example.com"))
            .collect();
        assert!(WeComMessage::news(nine).validate().is_err());
        assert!(
            WeComMessage::news(vec![Article::new("t", "")])
                .validate()
                .is_err()
        );
        assert!(
            WeComMessage::news(vec![Article::new("t", "https://example.com")])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_media_requires_id_or_path() {
        let empty = WeComMessage::File {
            file: MediaContent::default(),
        };
        assert!(empty.validate().is_err());
        assert!(WeComMessage::file("MID").validate().is_ok());
        assert!(WeComMessage::voice_from_path("/tmp/a.amr").validate().is_ok());
    }

    #[test]
    fn test_local_path_is_not_serialized_and_can_be_filled() {
        let mut msg = WeComMessage::file_from_path("/tmp/report.pdf");
        assert_eq!(
            msg.pending_upload().map(|(k, p)| (k, p.to_path_buf())),
            Some((MediaKind::File, PathBuf::from("/tmp/report.pdf")))
        );

        assert!(msg.set_media_id("MID"));
        assert!(msg.pending_upload().is_none());
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"msgtype": "file", "file": {"media_id": "MID"}})
        );
        assert!(!WeComMessage::text("x").set_media_id("MID"));
    }

    #[test]
    fn test_image_md5_and_size() {
        assert!(
            WeComMessage::image("aGVsbG8=", "5d41402abc4b2a76b9719d911017c592")
                .validate()
                .is_ok()
        );
        assert!(WeComMessage::image("aGVsbG8=", "xyz").validate().is_err());
        let huge = "A".repeat((IMAGE_MAX_BYTES / 3 + 1) * 4);
        assert!(
            WeComMessage::image(huge, "5d41402abc4b2a76b9719d911017c592")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_template_card_text_notice() {
        let card = text_card();
        let msg = WeComMessage::template_card(card.clone());
        assert!(msg.validate().is_ok());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["msgtype"], json!("template_card"));
        assert_eq!(value["template_card"]["card_type"], json!("text_notice"));
        assert_eq!(value["template_card"]["card_action"]["type"], json!(1));

        let mut with_image = card.clone();
        with_image.card_image = Some(CardImage {
            url: "https://example.com/a.png".to_string(),
            aspect_ratio: None,
        });
        assert!(WeComMessage::template_card(with_image).validate().is_err());
    }

    #[test]
    fn test_template_card_news_notice_rules() {
        let image = CardImage {
            url: "https://example.com/a.png".to_string(),
            aspect_ratio: Some(1.3),
        };
        let card = TemplateCard::news_notice(
            MainTitle {
                title: "News".to_string(),
                desc: String::new(),
            },
            image,
            CardAction::mini_program("wx123", "pages/index"),
        );
        assert!(WeComMessage::template_card(card.clone()).validate().is_ok());

        let mut with_sub = card.clone();
        with_sub.sub_title_text = Some("only for text".to_string());
        assert!(WeComMessage::template_card(with_sub).validate().is_err());

        let mut no_image = card;
        no_image.card_image = None;
        assert!(WeComMessage::template_card(no_image).validate().is_err());
    }

    #[test]
    fn test_template_card_length_caps() {
        let mut card = text_card();
        card.main_title = Some(MainTitle {
            title: "a".repeat(27),
            desc: String::new(),
        });
        assert!(WeComMessage::template_card(card).validate().is_err());

        let mut card = text_card();
        card.source = Some(CardSource {
            desc: "a".repeat(14),
            ..CardSource::default()
        });
        assert!(WeComMessage::template_card(card).validate().is_err());

        let mut card = text_card();
        card.horizontal_content_list = (0..7)
            .map(|i| HorizontalContent {
                keyname: format!("k{}", i),
                value: "v".to_string(),
                ..HorizontalContent::default()
            })
            .collect();
        assert!(WeComMessage::template_card(card).validate().is_err());

        let mut card = text_card();
        card.jump_list = (0..6)
            .map(|i| Jump {
                kind: Some(1),
                title: format!("j{}", i),
                url: "https://example.com".to_string(),
                ..Jump::default()
            })
            .collect();
        assert!(WeComMessage::template_card(card).validate().is_err());
    }

    #[test]
    fn test_template_card_jump_targets() {
        let mut card = text_card();
        card.jump_list = vec![Jump {
            kind: Some(2),
            title: "mini".to_string(),
            appid: "wx123".to_string(),
            ..Jump::default()
        }];
        assert!(WeComMessage::template_card(card).validate().is_err());

        let mut card = text_card();
        card.card_action = CardAction {
            kind: 1,
            ..CardAction::default()
        };
        assert!(WeComMessage::template_card(card).validate().is_err());
    }
}
