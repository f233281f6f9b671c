use crate::provider::{HttpCall, HttpProvider, Transformer, mismatch, normalize_base};
use crate::signer;
use crate::uploader::{MediaSource, MediaUploader};
use async_trait::async_trait;
use courier_core::common::ProviderType;
use courier_core::message::wecom::{IMAGE_MAX_BYTES, MediaKind};
use courier_core::message::{Message, Validate, WeComMessage};
use courier_core::notify::entity::{Account, SendContext, SendOptions};
use courier_core::notify::error::NotifyError;
use courier_core::notify::port::HttpClient;
use courier_core::notify::request::{HttpRequestSpec, RequestBody, ResponseHandlerConfig};

pub const WECOM_BASE_URL: &str = "https://qyapi.weixin.qq.com";

/// WeCom group-bot provider.
pub type WeComProvider = HttpProvider<WeComTransformer>;

/// # Summary
/// Transforms WeCom messages into webhook calls.
///
/// # Invariants
/// - File and voice messages holding only a local path are uploaded in `prepare`
///   with the account that later sends them.
pub struct WeComTransformer {
    base_url: String,
    uploader: MediaUploader,
}

impl Default for WeComTransformer {
    fn default() -> Self {
        Self::new(WECOM_BASE_URL)
    }
}

impl WeComTransformer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base(base_url),
            uploader: MediaUploader::new(base_url),
        }
    }

    pub fn uploader(&self) -> &MediaUploader {
        &self.uploader
    }
}

#[async_trait]
impl Transformer for WeComTransformer {
    fn provider_type(&self) -> ProviderType {
        ProviderType::WeCom
    }

    async fn prepare(
        &self,
        ctx: &SendContext,
        msg: &mut Message,
        account: &Account,
        client: &dyn HttpClient,
    ) -> Result<(), NotifyError> {
        let Message::WeCom(inner) = msg else {
            return Ok(());
        };
        let Some((kind, path)) = inner.pending_upload() else {
            return Ok(());
        };
        let source = MediaSource::path(path);
        let media_id = self.uploader.upload(ctx, client, account, kind, source).await?;
        inner.set_media_id(media_id);
        Ok(())
    }

    /// # Summary
    /// Builds `POST {base}/cgi-bin/webhook/send?key=<key>` with the message as JSON.
    ///
    /// Success requires `errcode == 0`; `errmsg` is reported otherwise.
    fn transform(&self, msg: &Message, account: &Account) -> Result<HttpCall, NotifyError> {
        let Message::WeCom(inner) = msg else {
            return Err(mismatch(ProviderType::WeCom, msg));
        };
        inner.validate()?;
        if account.credentials.key.is_empty() {
            return Err(NotifyError::Param(format!(
                "account {} has no webhook key",
                account.name
            )));
        }
        if let Some((kind, media)) = inner.media() {
            if media.media_id.is_empty() {
                return Err(NotifyError::Param(format!(
                    "{} message has no media_id",
                    kind.as_str()
                )));
            }
        }

        let request = HttpRequestSpec::post(format!("{}/cgi-bin/webhook/send", self.base_url))
            .with_query("key", account.credentials.key.as_str())
            .with_body(RequestBody::json(inner)?);
        let handler =
            ResponseHandlerConfig::json_field("errcode", 0).with_error_paths("errcode", "errmsg");
        Ok(HttpCall { request, handler })
    }
}

/// # Summary
/// Media uploaded ahead of time, together with the account that owns it.
///
/// # Invariants
/// - `media_id` is only accepted by the bot that uploaded it, so follow-up sends must be
///   pinned to `account` (see `pin`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub kind: MediaKind,
    pub media_id: String,
    pub account: String,
}

impl UploadedMedia {
    /// Pins `ctx` to the uploading account, keeping its cancellation token.
    pub fn pin(&self, ctx: SendContext) -> SendContext {
        ctx.with_account(self.account.clone())
    }

    /// A file or voice message referencing this media.
    pub fn message(&self) -> WeComMessage {
        match self.kind {
            MediaKind::File => WeComMessage::file(self.media_id.clone()),
            MediaKind::Voice => WeComMessage::voice(self.media_id.clone()),
        }
    }
}

impl HttpProvider<WeComTransformer> {
    /// # Summary
    /// Uploads media ahead of time.
    ///
    /// # Logic
    /// 1. Selects the account exactly like `send` would (a pinned name wins).
    /// 2. Uploads with that account and reports its name next to the id, since a
    ///    later unpinned send may rotate to another bot.
    pub async fn upload_media(
        &self,
        ctx: &SendContext,
        kind: MediaKind,
        source: MediaSource,
        opts: &SendOptions,
    ) -> Result<UploadedMedia, NotifyError> {
        let account = self
            .selector()
            .select(ctx)
            .map_err(|e| e.with_context(ProviderType::WeCom, None))?;
        let media_id = self
            .transformer()
            .uploader()
            .upload(ctx, self.client(opts), account, kind, source)
            .await
            .map_err(|e| e.with_context(ProviderType::WeCom, Some(&account.name)))?;
        Ok(UploadedMedia {
            kind,
            media_id,
            account: account.name.clone(),
        })
    }
}

/// # Summary
/// Builds an image message from raw bytes.
///
/// # Returns
/// * `NotifyError::Param` when the image is empty or larger than 2 MiB.
pub fn image_message(data: &[u8]) -> Result<WeComMessage, NotifyError> {
    if data.is_empty() {
        return Err(NotifyError::Param("image cannot be empty".to_string()));
    }
    if data.len() > IMAGE_MAX_BYTES {
        return Err(NotifyError::Param(format!(
            "image exceeds {} bytes",
            IMAGE_MAX_BYTES
        )));
    }
    Ok(WeComMessage::image(
        signer::base64_encode(data),
        signer::md5_hex(data),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transform_shape() {
        let transformer = WeComTransformer::default();
        let msg = Message::from(WeComMessage::text("hello"));
        let call = transformer.transform(&msg, &Account::new("bot", "K")).unwrap();
        assert_eq!(call.request.url, "https://qyapi.weixin.qq.com/cgi-bin/webhook/send");
        assert_eq!(call.request.query_value("key"), Some("K"));
        assert_eq!(
            call.request.body.as_json().unwrap(),
            json!({"msgtype": "text", "text": {"content": "hello"}})
        );
    }

    #[test]
    fn test_unuploaded_media_is_rejected_by_transform() {
        let transformer = WeComTransformer::default();
        let msg = Message::from(WeComMessage::file_from_path("/tmp/none.pdf"));
        let err = transformer.transform(&msg, &Account::new("bot", "K")).unwrap_err();
        assert!(matches!(err, NotifyError::Param(_)));
    }

    #[test]
    fn test_invalid_message_is_rejected_before_building() {
        let transformer = WeComTransformer::default();
        let msg = Message::from(WeComMessage::markdown("a".repeat(4097)));
        let err = transformer.transform(&msg, &Account::new("bot", "K")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter error: markdown content exceeds 4096 characters"
        );

        let empty = Message::from(WeComMessage::news(vec![]));
        assert!(matches!(
            transformer.transform(&empty, &Account::new("bot", "K")),
            Err(NotifyError::Param(_))
        ));
    }

    #[test]
    fn test_image_helper() {
        let msg = image_message(b"hello").unwrap();
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "msgtype": "image",
                "image": {"base64": "aGVsbG8=", "md5": "5d41402abc4b2a76b9719d911017c592"}
            })
        );
        assert!(image_message(&[]).is_err());
        assert!(image_message(&vec![0u8; IMAGE_MAX_BYTES + 1]).is_err());
    }
}
