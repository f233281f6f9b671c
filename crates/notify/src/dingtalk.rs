use crate::provider::{HttpCall, HttpProvider, Transformer, mismatch, normalize_base};
use crate::signer;
use courier_core::common::ProviderType;
use courier_core::common::time::{RealTimeProvider, TimeProvider};
use courier_core::message::{Message, Validate};
use courier_core::notify::entity::Account;
use courier_core::notify::error::NotifyError;
use courier_core::notify::request::{HttpRequestSpec, RequestBody, ResponseHandlerConfig};
use std::sync::Arc;

pub const DINGTALK_BASE_URL: &str = "https://oapi.dingtalk.com";

/// DingTalk custom-robot provider.
pub type DingTalkProvider = HttpProvider<DingTalkTransformer>;

/// # Summary
/// Transforms DingTalk robot messages into webhook calls.
///
/// # Invariants
/// - The signing timestamp comes from the injected clock, never from the system directly.
pub struct DingTalkTransformer {
    base_url: String,
    clock: Arc<dyn TimeProvider>,
}

impl Default for DingTalkTransformer {
    fn default() -> Self {
        Self::new(DINGTALK_BASE_URL)
    }
}

impl DingTalkTransformer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base(base_url),
            clock: Arc::new(RealTimeProvider),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }
}

impl Transformer for DingTalkTransformer {
    fn provider_type(&self) -> ProviderType {
        ProviderType::DingTalk
    }

    /// # Summary
    /// Builds `POST {base}/robot/send?access_token=<key>`.
    ///
    /// # Logic
    /// 1. Appends `timestamp` and `sign` when the account has a secret.
    /// 2. Encodes the message as JSON.
    /// 3. Success requires `errcode == 0`; `errmsg` is reported otherwise.
    fn transform(&self, msg: &Message, account: &Account) -> Result<HttpCall, NotifyError> {
        let Message::DingTalk(inner) = msg else {
            return Err(mismatch(ProviderType::DingTalk, msg));
        };
        inner.validate()?;
        if account.credentials.key.is_empty() {
            return Err(NotifyError::Param(format!(
                "account {} has no access token",
                account.name
            )));
        }

        let mut request = HttpRequestSpec::post(format!("{}/robot/send", self.base_url))
            .with_query("access_token", account.credentials.key.as_str());
        if let Some(secret) = account.secret() {
            let timestamp = self.clock.now().timestamp_millis();
            let sign = signer::dingtalk_sign(timestamp, secret)?;
            request = request
                .with_query("timestamp", timestamp.to_string())
                .with_query("sign", sign);
        }

        let handler =
            ResponseHandlerConfig::json_field("errcode", 0).with_error_paths("errcode", "errmsg");
        Ok(HttpCall {
            request: request.with_body(RequestBody::json(inner)?),
            handler,
        })
    }
}
