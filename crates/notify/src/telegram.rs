use crate::provider::{HttpCall, HttpProvider, Transformer, mismatch, normalize_base};
use courier_core::common::ProviderType;
use courier_core::message::{Message, Validate};
use courier_core::notify::entity::Account;
use courier_core::notify::error::NotifyError;
use courier_core::notify::request::{HttpRequestSpec, RequestBody, ResponseHandlerConfig};

pub const TELEGRAM_BASE_URL: &str = "https://api.telegram.org";

/// Telegram Bot API provider.
pub type TelegramProvider = HttpProvider<TelegramTransformer>;

/// # Summary
/// Transforms Telegram messages into Bot API calls.
///
/// # Invariants
/// - The method name is derived from the message variant only.
/// - 4xx replies with a JSON body become API errors built from `error_code` and
///   `description`; any other non-2xx reply is a transport error.
pub struct TelegramTransformer {
    base_url: String,
}

impl Default for TelegramTransformer {
    fn default() -> Self {
        Self::new(TELEGRAM_BASE_URL)
    }
}

impl TelegramTransformer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base(base_url),
        }
    }
}

impl Transformer for TelegramTransformer {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Telegram
    }

    fn transform(&self, msg: &Message, account: &Account) -> Result<HttpCall, NotifyError> {
        let Message::Telegram(inner) = msg else {
            return Err(mismatch(ProviderType::Telegram, msg));
        };
        inner.validate()?;
        if account.credentials.key.is_empty() {
            return Err(NotifyError::Param(format!(
                "account {} has no bot token",
                account.name
            )));
        }

        let request = HttpRequestSpec::post(format!(
            "{}/bot{}/{}",
            self.base_url,
            account.credentials.key,
            inner.endpoint()
        ))
        .with_body(RequestBody::json(inner)?);
        let handler = ResponseHandlerConfig::json_field("ok", true)
            .with_error_paths("error_code", "description")
            .with_metadata("message_id", "result.message_id")
            .with_json_error_range(400..=499);
        Ok(HttpCall { request, handler })
    }
}
