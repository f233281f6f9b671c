use crate::dingtalk::{DINGTALK_BASE_URL, DingTalkTransformer};
use crate::email::EmailProvider;
use crate::http::ReqwestClient;
use crate::provider::HttpProvider;
use crate::telegram::{TELEGRAM_BASE_URL, TelegramTransformer};
use crate::wecom::{WECOM_BASE_URL, WeComTransformer};
use courier_core::common::ProviderType;
use courier_core::config::AppConfig;
use courier_core::message::Message;
use courier_core::notify::entity::{SendContext, SendOptions, SendResult};
use courier_core::notify::error::NotifyError;
use courier_core::notify::port::{HttpClient, Provider};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// # Summary
/// Routes messages to the provider registered for their platform.
///
/// # Invariants
/// - At most one provider per `ProviderType`; registering again replaces the old one.
/// - Registration and sending may happen concurrently.
#[derive(Default)]
pub struct Dispatcher {
    providers: DashMap<ProviderType, Arc<dyn Provider>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// Builds every provider configured in `config`.
    ///
    /// # Logic
    /// 1. Creates one shared reqwest client with the configured timeout.
    /// 2. Registers each present, non-disabled pool; a disabled pool is skipped.
    /// 3. A present pool without enabled accounts is a configuration error.
    pub fn from_config(config: &AppConfig) -> Result<Self, NotifyError> {
        let timeout = Duration::from_secs(config.http.timeout_secs);
        let client: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(timeout)?);
        Self::from_config_with_client(config, client)
    }

    /// Same as `from_config` with a caller-supplied HTTP client.
    pub fn from_config_with_client(
        config: &AppConfig,
        client: Arc<dyn HttpClient>,
    ) -> Result<Self, NotifyError> {
        let dispatcher = Self::new();

        if let Some(pool) = config.dingtalk.as_ref().filter(|p| !p.disabled) {
            let base = pool.base_url.as_deref().unwrap_or(DINGTALK_BASE_URL);
            let provider = HttpProvider::new(DingTalkTransformer::new(base), pool.clone(), client.clone())?;
            dispatcher.register(Arc::new(provider));
        }
        if let Some(pool) = config.wecom.as_ref().filter(|p| !p.disabled) {
            let base = pool.base_url.as_deref().unwrap_or(WECOM_BASE_URL);
            let provider = HttpProvider::new(WeComTransformer::new(base), pool.clone(), client.clone())?;
            dispatcher.register(Arc::new(provider));
        }
        if let Some(pool) = config.telegram.as_ref().filter(|p| !p.disabled) {
            let base = pool.base_url.as_deref().unwrap_or(TELEGRAM_BASE_URL);
            let provider = HttpProvider::new(TelegramTransformer::new(base), pool.clone(), client.clone())?;
            dispatcher.register(Arc::new(provider));
        }
        if let Some(pool) = config.email.as_ref().filter(|p| !p.disabled) {
            let timeout = Duration::from_secs(config.http.timeout_secs);
            dispatcher.register(Arc::new(EmailProvider::with_lettre(pool.clone(), Some(timeout))?));
        }

        info!(providers = ?dispatcher.registered(), "dispatcher ready");
        Ok(dispatcher)
    }

    pub fn register(&self, provider: Arc<dyn Provider>) {
        let kind = provider.provider_type();
        debug!(provider = %kind, "provider registered");
        self.providers.insert(kind, provider);
    }

    pub fn provider(&self, kind: ProviderType) -> Option<Arc<dyn Provider>> {
        self.providers.get(&kind).map(|p| p.value().clone())
    }

    /// Registered platforms in a stable order.
    pub fn registered(&self) -> Vec<ProviderType> {
        let mut kinds: Vec<ProviderType> = self.providers.iter().map(|e| *e.key()).collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }

    /// # Summary
    /// Sends `msg` through the provider of its platform.
    ///
    /// # Returns
    /// * `NotifyError::Config` (with provider context) when no provider is registered for it.
    pub async fn send(
        &self,
        ctx: &SendContext,
        msg: &mut Message,
        opts: &SendOptions,
    ) -> Result<SendResult, NotifyError> {
        let kind = msg.provider_type();
        // clone out of the map so no shard lock is held across the await
        let provider = self.provider(kind).ok_or_else(|| {
            NotifyError::Config(format!("provider {} is not configured", kind)).with_context(kind, None)
        })?;
        provider.send(ctx, msg, opts).await
    }
}
