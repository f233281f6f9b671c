//! Telegram Bot API 消息。
//!
//! 每个变体对应一个 Bot API 方法，见 [`TelegramMessage::endpoint`]。
//! 回复统一使用 `reply_parameters`，已废弃的 `reply_to_message_id` 不再提供。

use super::{Validate, count_in, max_chars, param, require};
use crate::notify::error::NotifyError;
use serde::{Deserialize, Serialize};

pub const TEXT_MAX_CHARS: usize = 4096;
pub const CAPTION_MAX_CHARS: usize = 1024;
pub const POLL_QUESTION_MAX_CHARS: usize = 300;
pub const POLL_OPTION_MAX_CHARS: usize = 100;
pub const POLL_MIN_OPTIONS: usize = 2;
pub const POLL_MAX_OPTIONS: usize = 10;
pub const POLL_EXPLANATION_MAX_CHARS: usize = 200;
/// `sendDice` 支持的表情
pub const DICE_EMOJIS: [&str; 6] = ["🎲", "🎯", "🏀", "⚽", "🎳", "🎰"];

/// # Summary
/// Telegram 消息，序列化后带有 `msgtype` 标签 (平台会忽略该字段)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msgtype", rename_all = "snake_case")]
pub enum TelegramMessage {
    Text(TextMessage),
    Photo(PhotoMessage),
    Audio(AudioMessage),
    Voice(VoiceMessage),
    Document(DocumentMessage),
    Video(VideoMessage),
    Animation(AnimationMessage),
    VideoNote(VideoNoteMessage),
    Location(LocationMessage),
    Contact(ContactMessage),
    Poll(PollMessage),
    Dice(DiceMessage),
    Venue(VenueMessage),
}

/// 文本格式化模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
}

/// 回复目标
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyParameters {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_sending_without_reply: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

/// # Summary
/// 所有发送方法共有的字段。
///
/// # Invariants
/// - `chat_id` 为数字 ID 或 `@channelusername`，不能为空。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Common {
    pub chat_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_connection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protect_content: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
    // InlineKeyboardMarkup / ReplyKeyboardMarkup 等，原样透传
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<serde_json::Value>,
}

impl Common {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), NotifyError> {
        require("chat_id", &self.chat_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Mention,
    Hashtag,
    Cashtag,
    BotCommand,
    Url,
    Email,
    PhoneNumber,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Blockquote,
    ExpandableBlockquote,
    Code,
    Pre,
    TextLink,
    TextMention,
    CustomEmoji,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// # Summary
/// 文本中的特殊实体。
///
/// # Invariants
/// - `text_link` 需要 `url`，`text_mention` 需要 `user`，`custom_emoji` 需要 `custom_emoji_id`。
/// - `language` 只能出现在 `pre` 上。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: EntityType,
    pub offset: u32,
    pub length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emoji_id: Option<String>,
}

impl MessageEntity {
    pub fn new(kind: EntityType, offset: u32, length: u32) -> Self {
        Self {
            kind,
            offset,
            length,
            url: None,
            user: None,
            language: None,
            custom_emoji_id: None,
        }
    }

    fn validate(&self) -> Result<(), NotifyError> {
        if self.length == 0 {
            return Err(param("message entity length must be positive"));
        }
        match self.kind {
            EntityType::TextLink if self.url.as_deref().is_none_or(str::is_empty) => {
                Err(param("text_link entity requires url"))
            }
            EntityType::TextMention if self.user.is_none() => {
                Err(param("text_mention entity requires user"))
            }
            EntityType::CustomEmoji if self.custom_emoji_id.as_deref().is_none_or(str::is_empty) => {
                Err(param("custom_emoji entity requires custom_emoji_id"))
            }
            kind if kind != EntityType::Pre && self.language.is_some() => {
                Err(param("only pre entities may set language"))
            }
            _ => Ok(()),
        }
    }
}

fn validate_entities(entities: &[MessageEntity]) -> Result<(), NotifyError> {
    entities.iter().try_for_each(MessageEntity::validate)
}

/// 链接预览设置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPreviewOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_small_media: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_large_media: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_above_text: Option<bool>,
}

/// 媒体说明文字
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption_entities: Vec<MessageEntity>,
}

impl Caption {
    fn validate(&self) -> Result<(), NotifyError> {
        if let Some(caption) = &self.caption {
            max_chars("caption", caption, CAPTION_MAX_CHARS)?;
        }
        validate_entities(&self.caption_entities)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMessage {
    #[serde(flatten)]
    pub common: Common,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_preview_options: Option<LinkPreviewOptions>,
}

/// 图片：`photo` 为 file_id 或 HTTP URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMessage {
    #[serde(flatten)]
    pub common: Common,
    pub photo: String,
    #[serde(flatten)]
    pub caption: Caption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_caption_above_media: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_spoiler: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMessage {
    #[serde(flatten)]
    pub common: Common,
    pub audio: String,
    #[serde(flatten)]
    pub caption: Caption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceMessage {
    #[serde(flatten)]
    pub common: Common,
    pub voice: String,
    #[serde(flatten)]
    pub caption: Caption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMessage {
    #[serde(flatten)]
    pub common: Common,
    pub document: String,
    #[serde(flatten)]
    pub caption: Caption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_content_type_detection: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMessage {
    #[serde(flatten)]
    pub common: Common,
    pub video: String,
    #[serde(flatten)]
    pub caption: Caption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_caption_above_media: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_spoiler: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_streaming: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationMessage {
    #[serde(flatten)]
    pub common: Common,
    pub animation: String,
    #[serde(flatten)]
    pub caption: Caption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_caption_above_media: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_spoiler: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoNoteMessage {
    #[serde(flatten)]
    pub common: Common,
    pub video_note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    // 视频直径
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationMessage {
    #[serde(flatten)]
    pub common: Common,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity_alert_radius: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(flatten)]
    pub common: Common,
    pub phone_number: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcard: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPollOption {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_parse_mode: Option<ParseMode>,
}

impl InputPollOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            text_parse_mode: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollType {
    Regular,
    Quiz,
}

/// # Summary
/// 投票。
///
/// # Invariants
/// - 选项数 2..=10。
/// - quiz 必须给出合法的 `correct_option_id`。
/// - `open_period` 与 `close_date` 互斥。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollMessage {
    #[serde(flatten)]
    pub common: Common,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_parse_mode: Option<ParseMode>,
    pub options: Vec<InputPollOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_anonymous: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub poll_type: Option<PollType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allows_multiple_answers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation_parse_mode: Option<ParseMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_closed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceMessage {
    #[serde(flatten)]
    pub common: Common,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueMessage {
    #[serde(flatten)]
    pub common: Common,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foursquare_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foursquare_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_place_type: Option<String>,
}

impl TelegramMessage {
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        TelegramMessage::Text(TextMessage {
            common: Common::new(chat_id),
            text: text.into(),
            parse_mode: None,
            entities: Vec::new(),
            link_preview_options: None,
        })
    }

    pub fn photo(chat_id: impl Into<String>, photo: impl Into<String>) -> Self {
        TelegramMessage::Photo(PhotoMessage {
            common: Common::new(chat_id),
            photo: photo.into(),
            caption: Caption::default(),
            show_caption_above_media: None,
            has_spoiler: None,
        })
    }

    pub fn audio(chat_id: impl Into<String>, audio: impl Into<String>) -> Self {
        TelegramMessage::Audio(AudioMessage {
            common: Common::new(chat_id),
            audio: audio.into(),
            caption: Caption::default(),
            duration: None,
            performer: None,
            title: None,
            thumbnail: None,
        })
    }

    pub fn voice(chat_id: impl Into<String>, voice: impl Into<String>) -> Self {
        TelegramMessage::Voice(VoiceMessage {
            common: Common::new(chat_id),
            voice: voice.into(),
            caption: Caption::default(),
            duration: None,
        })
    }

    pub fn document(chat_id: impl Into<String>, document: impl Into<String>) -> Self {
        TelegramMessage::Document(DocumentMessage {
            common: Common::new(chat_id),
            document: document.into(),
            caption: Caption::default(),
            thumbnail: None,
            disable_content_type_detection: None,
        })
    }

    pub fn video(chat_id: impl Into<String>, video: impl Into<String>) -> Self {
        TelegramMessage::Video(VideoMessage {
            common: Common::new(chat_id),
            video: video.into(),
            caption: Caption::default(),
            duration: None,
            width: None,
            height: None,
            thumbnail: None,
            show_caption_above_media: None,
            has_spoiler: None,
            supports_streaming: None,
        })
    }

    pub fn animation(chat_id: impl Into<String>, animation: impl Into<String>) -> Self {
        TelegramMessage::Animation(AnimationMessage {
            common: Common::new(chat_id),
            animation: animation.into(),
            caption: Caption::default(),
            duration: None,
            width: None,
            height: None,
            thumbnail: None,
            show_caption_above_media: None,
            has_spoiler: None,
        })
    }

    pub fn video_note(chat_id: impl Into<String>, video_note: impl Into<String>) -> Self {
        TelegramMessage::VideoNote(VideoNoteMessage {
            common: Common::new(chat_id),
            video_note: video_note.into(),
            duration: None,
            length: None,
            thumbnail: None,
        })
    }

    pub fn location(chat_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        TelegramMessage::Location(LocationMessage {
            common: Common::new(chat_id),
            latitude,
            longitude,
            horizontal_accuracy: None,
            live_period: None,
            heading: None,
            proximity_alert_radius: None,
        })
    }

    pub fn contact(
        chat_id: impl Into<String>,
        phone_number: impl Into<String>,
        first_name: impl Into<String>,
    ) -> Self {
        TelegramMessage::Contact(ContactMessage {
            common: Common::new(chat_id),
            phone_number: phone_number.into(),
            first_name: first_name.into(),
            last_name: None,
            vcard: None,
        })
    }

    pub fn poll(
        chat_id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<InputPollOption>,
    ) -> Self {
        TelegramMessage::Poll(PollMessage {
            common: Common::new(chat_id),
            question: question.into(),
            question_parse_mode: None,
            options,
            is_anonymous: None,
            poll_type: None,
            allows_multiple_answers: None,
            correct_option_id: None,
            explanation: None,
            explanation_parse_mode: None,
            open_period: None,
            close_date: None,
            is_closed: None,
        })
    }

    pub fn dice(chat_id: impl Into<String>) -> Self {
        TelegramMessage::Dice(DiceMessage {
            common: Common::new(chat_id),
            emoji: None,
        })
    }

    pub fn venue(
        chat_id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        title: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        TelegramMessage::Venue(VenueMessage {
            common: Common::new(chat_id),
            latitude,
            longitude,
            title: title.into(),
            address: address.into(),
            foursquare_id: None,
            foursquare_type: None,
            google_place_id: None,
            google_place_type: None,
        })
    }

    pub fn msg_type(&self) -> &'static str {
        match self {
            TelegramMessage::Text(_) => "text",
            TelegramMessage::Photo(_) => "photo",
            TelegramMessage::Audio(_) => "audio",
            TelegramMessage::Voice(_) => "voice",
            TelegramMessage::Document(_) => "document",
            TelegramMessage::Video(_) => "video",
            TelegramMessage::Animation(_) => "animation",
            TelegramMessage::VideoNote(_) => "video_note",
            TelegramMessage::Location(_) => "location",
            TelegramMessage::Contact(_) => "contact",
            TelegramMessage::Poll(_) => "poll",
            TelegramMessage::Dice(_) => "dice",
            TelegramMessage::Venue(_) => "venue",
        }
    }

    /// Bot API 方法名，拼接在 `/bot<token>/` 之后
    pub fn endpoint(&self) -> &'static str {
        match self {
            TelegramMessage::Text(_) => "sendMessage",
            TelegramMessage::Photo(_) => "sendPhoto",
            TelegramMessage::Audio(_) => "sendAudio",
            TelegramMessage::Voice(_) => "sendVoice",
            TelegramMessage::Document(_) => "sendDocument",
            TelegramMessage::Video(_) => "sendVideo",
            TelegramMessage::Animation(_) => "sendAnimation",
            TelegramMessage::VideoNote(_) => "sendVideoNote",
            TelegramMessage::Location(_) => "sendLocation",
            TelegramMessage::Contact(_) => "sendContact",
            TelegramMessage::Poll(_) => "sendPoll",
            TelegramMessage::Dice(_) => "sendDice",
            TelegramMessage::Venue(_) => "sendVenue",
        }
    }

    pub fn common(&self) -> &Common {
        match self {
            TelegramMessage::Text(m) => &m.common,
            TelegramMessage::Photo(m) => &m.common,
            TelegramMessage::Audio(m) => &m.common,
            TelegramMessage::Voice(m) => &m.common,
            TelegramMessage::Document(m) => &m.common,
            TelegramMessage::Video(m) => &m.common,
            TelegramMessage::Animation(m) => &m.common,
            TelegramMessage::VideoNote(m) => &m.common,
            TelegramMessage::Location(m) => &m.common,
            TelegramMessage::Contact(m) => &m.common,
            TelegramMessage::Poll(m) => &m.common,
            TelegramMessage::Dice(m) => &m.common,
            TelegramMessage::Venue(m) => &m.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut Common {
        match self {
            TelegramMessage::Text(m) => &mut m.common,
            TelegramMessage::Photo(m) => &mut m.common,
            TelegramMessage::Audio(m) => &mut m.common,
            TelegramMessage::Voice(m) => &mut m.common,
            TelegramMessage::Document(m) => &mut m.common,
            TelegramMessage::Video(m) => &mut m.common,
            TelegramMessage::Animation(m) => &mut m.common,
            TelegramMessage::VideoNote(m) => &mut m.common,
            TelegramMessage::Location(m) => &mut m.common,
            TelegramMessage::Contact(m) => &mut m.common,
            TelegramMessage::Poll(m) => &mut m.common,
            TelegramMessage::Dice(m) => &mut m.common,
            TelegramMessage::Venue(m) => &mut m.common,
        }
    }

    /// 设置回复目标
    pub fn reply_to(mut self, reply: ReplyParameters) -> Self {
        self.common_mut().reply_parameters = Some(reply);
        self
    }
}

impl Validate for TelegramMessage {
    fn validate(&self) -> Result<(), NotifyError> {
        self.common().validate()?;
        match self {
            TelegramMessage::Text(m) => {
                require("text", &m.text)?;
                max_chars("text", &m.text, TEXT_MAX_CHARS)?;
                validate_entities(&m.entities)
            }
            TelegramMessage::Photo(m) => {
                require("photo", &m.photo)?;
                m.caption.validate()
            }
            TelegramMessage::Audio(m) => {
                require("audio", &m.audio)?;
                m.caption.validate()
            }
            TelegramMessage::Voice(m) => {
                require("voice", &m.voice)?;
                m.caption.validate()
            }
            TelegramMessage::Document(m) => {
                require("document", &m.document)?;
                m.caption.validate()
            }
            TelegramMessage::Video(m) => {
                require("video", &m.video)?;
                m.caption.validate()
            }
            TelegramMessage::Animation(m) => {
                require("animation", &m.animation)?;
                m.caption.validate()
            }
            TelegramMessage::VideoNote(m) => require("video_note", &m.video_note),
            TelegramMessage::Location(m) => {
                check_coordinates(m.latitude, m.longitude)?;
                if m.horizontal_accuracy.is_some_and(|a| !(0.0..=1500.0).contains(&a)) {
                    return Err(param("horizontal_accuracy must be between 0 and 1500"));
                }
                if m.heading.is_some_and(|h| !(1..=360).contains(&h)) {
                    return Err(param("heading must be between 1 and 360"));
                }
                Ok(())
            }
            TelegramMessage::Contact(m) => {
                require("phone_number", &m.phone_number)?;
                require("first_name", &m.first_name)
            }
            TelegramMessage::Poll(m) => m.validate(),
            TelegramMessage::Dice(m) => match m.emoji.as_deref() {
                Some(emoji) if !DICE_EMOJIS.contains(&emoji) => {
                    Err(param(format!("unsupported dice emoji {}", emoji)))
                }
                _ => Ok(()),
            },
            TelegramMessage::Venue(m) => {
                check_coordinates(m.latitude, m.longitude)?;
                require("venue title", &m.title)?;
                require("venue address", &m.address)
            }
        }
    }
}

impl PollMessage {
    fn validate(&self) -> Result<(), NotifyError> {
        require("poll question", &self.question)?;
        max_chars("poll question", &self.question, POLL_QUESTION_MAX_CHARS)?;
        count_in("poll options", self.options.len(), POLL_MIN_OPTIONS, POLL_MAX_OPTIONS)?;
        for option in &self.options {
            require("poll option", &option.text)?;
            max_chars("poll option", &option.text, POLL_OPTION_MAX_CHARS)?;
        }

        if self.poll_type == Some(PollType::Quiz) {
            match self.correct_option_id {
                Some(id) if usize::try_from(id).is_ok_and(|i| i < self.options.len()) => {}
                Some(_) => return Err(param("correct_option_id is out of range")),
                None => return Err(param("quiz poll requires correct_option_id")),
            }
        } else if self.explanation.is_some() {
            return Err(param("explanation is only allowed for quiz polls"));
        }

        if let Some(explanation) = &self.explanation {
            max_chars("explanation", explanation, POLL_EXPLANATION_MAX_CHARS)?;
        }
        if let Some(period) = self.open_period {
            if !(5..=600).contains(&period) {
                return Err(param("open_period must be between 5 and 600 seconds"));
            }
            if self.close_date.is_some() {
                return Err(param("open_period and close_date are mutually exclusive"));
            }
        }
        Ok(())
    }
}

fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), NotifyError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(param("latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(param("longitude must be between -180 and 180"));
    }
    Ok(())
}
