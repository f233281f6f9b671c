use crate::response;
use crate::selector::Selector;
use async_trait::async_trait;
use courier_core::common::ProviderType;
use courier_core::config::PoolConfig;
use courier_core::message::{Message, Validate};
use courier_core::notify::entity::{Account, SendContext, SendOptions, SendResult};
use courier_core::notify::error::NotifyError;
use courier_core::notify::port::{HttpClient, Provider};
use courier_core::notify::request::{HttpRequestSpec, HttpResponse, ResponseHandlerConfig};
use std::sync::Arc;
use tracing::{debug, info};

/// A request ready to execute together with the rule that classifies its reply.
#[derive(Debug, Clone)]
pub struct HttpCall {
    pub request: HttpRequestSpec,
    pub handler: ResponseHandlerConfig,
}

/// # Summary
/// Maps a message and an account to a platform request.
///
/// # Invariants
/// - `transform` is pure and performs no I/O. It validates the message first and
///   rejects an invalid one with `NotifyError::Param` before building anything.
/// - `prepare` is the only hook allowed to mutate the message, and it runs with the same
///   account that `transform` receives.
#[async_trait]
pub trait Transformer: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// # Summary
    /// Optional I/O step before transformation, e.g. uploading a local file.
    ///
    /// # Arguments
    /// * `ctx` - Call context, honoured for cancellation.
    /// * `msg` - The message; may be mutated once.
    /// * `account` - The account selected for this send.
    /// * `client` - The HTTP client of this call (respects per-call overrides).
    async fn prepare(
        &self,
        _ctx: &SendContext,
        _msg: &mut Message,
        _account: &Account,
        _client: &dyn HttpClient,
    ) -> Result<(), NotifyError> {
        Ok(())
    }

    fn transform(&self, msg: &Message, account: &Account) -> Result<HttpCall, NotifyError>;
}

/// Error for a message routed to a provider of another platform.
pub(crate) fn mismatch(expected: ProviderType, msg: &Message) -> NotifyError {
    NotifyError::Param(format!(
        "message for {} cannot be sent by {} provider",
        msg.provider_type(),
        expected
    ))
}

/// Strips trailing slashes so paths can be appended with `format!`.
pub(crate) fn normalize_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// # Summary
/// Runs one HTTP exchange under the context's cancellation token.
///
/// # Logic
/// 1. Returns `Cancelled` without issuing anything if the token already fired.
/// 2. Otherwise races the exchange against the token; cancellation drops the in-flight future.
pub async fn execute(
    ctx: &SendContext,
    client: &dyn HttpClient,
    request: HttpRequestSpec,
) -> Result<HttpResponse, NotifyError> {
    if ctx.is_cancelled() {
        return Err(NotifyError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(NotifyError::Cancelled),
        response = client.execute(request) => response,
    }
}

/// # Summary
/// Generic provider shell: validate, select, prepare, transform, execute, classify.
///
/// # Invariants
/// - Safe for concurrent `send`; the only shared mutable state is the selector counter.
/// - Every error leaving `send` carries the provider tag and, once selected, the account name.
pub struct HttpProvider<T> {
    transformer: T,
    selector: Selector<Account>,
    client: Arc<dyn HttpClient>,
}

impl<T: Transformer> HttpProvider<T> {
    /// # Summary
    /// Builds a provider over an account pool.
    ///
    /// # Returns
    /// * `NotifyError::Config` if the pool is disabled or has no enabled account.
    pub fn new(transformer: T, pool: PoolConfig, client: Arc<dyn HttpClient>) -> Result<Self, NotifyError> {
        let provider = transformer.provider_type();
        let selector = Selector::from_pool(pool).map_err(|e| e.with_context(provider, None))?;
        Ok(Self {
            transformer,
            selector,
            client,
        })
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    pub fn selector(&self) -> &Selector<Account> {
        &self.selector
    }

    /// The per-call override if present, the provider's own client otherwise.
    pub(crate) fn client<'a>(&'a self, opts: &'a SendOptions) -> &'a dyn HttpClient {
        opts.http_client.as_deref().unwrap_or(self.client.as_ref())
    }

    fn check(&self, msg: &Message) -> Result<(), NotifyError> {
        let provider = self.transformer.provider_type();
        if msg.provider_type() != provider {
            return Err(mismatch(provider, msg));
        }
        msg.validate()
    }

    async fn deliver(
        &self,
        ctx: &SendContext,
        msg: &mut Message,
        account: &Account,
        client: &dyn HttpClient,
    ) -> Result<SendResult, NotifyError> {
        if ctx.is_cancelled() {
            return Err(NotifyError::Cancelled);
        }
        self.transformer.prepare(ctx, msg, account, client).await?;

        let call = self.transformer.transform(msg, account)?;
        debug!(
            provider = %self.transformer.provider_type(),
            account = %account.name,
            msg_type = msg.msg_type(),
            url = %call.request.url,
            "request built"
        );

        let response = execute(ctx, client, call.request).await?;
        response::classify(&call.handler, response)
    }
}

#[async_trait]
impl<T: Transformer> Provider for HttpProvider<T> {
    fn provider_type(&self) -> ProviderType {
        self.transformer.provider_type()
    }

    async fn send(
        &self,
        ctx: &SendContext,
        msg: &mut Message,
        opts: &SendOptions,
    ) -> Result<SendResult, NotifyError> {
        let provider = self.transformer.provider_type();
        self.check(msg).map_err(|e| e.with_context(provider, None))?;
        let account = self
            .selector
            .select(ctx)
            .map_err(|e| e.with_context(provider, None))?;

        let result = self
            .deliver(ctx, msg, account, self.client(opts))
            .await
            .map_err(|e| e.with_context(provider, Some(&account.name)))?;

        info!(
            provider = %provider,
            account = %account.name,
            msg_type = msg.msg_type(),
            status = result.status_code,
            "notification sent"
        );
        Ok(result)
    }
}
