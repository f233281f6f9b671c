use crate::provider::mismatch;
use crate::selector::Selector;
use async_trait::async_trait;
use courier_core::common::ProviderType;
use courier_core::config::PoolConfig;
use courier_core::message::email::EmailAttachment;
use courier_core::message::{EmailMessage, Message, Validate};
use courier_core::notify::entity::{EmailAccount, SendContext, SendOptions, SendResult};
use courier_core::notify::error::NotifyError;
use courier_core::notify::port::Provider;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsPolicy {
    /// TLS from the first byte (SMTPS).
    Implicit,
    /// Plain connection upgraded with STARTTLS when the server offers it.
    Opportunistic,
}

impl TlsPolicy {
    /// Port 465 uses implicit TLS; every other port tries STARTTLS.
    pub fn for_port(port: u16) -> Self {
        match port {
            465 => TlsPolicy::Implicit,
            _ => TlsPolicy::Opportunistic,
        }
    }
}

/// # Summary
/// Everything needed for one SMTP delivery: where, how, as whom and what.
#[derive(Debug, Clone)]
pub struct SmtpSession {
    pub host: String,
    pub port: u16,
    pub tls: TlsPolicy,
    pub username: String,
    pub password: Option<String>,
    pub message: lettre::Message,
}

fn mailbox(field: &str, addr: &str) -> Result<Mailbox, NotifyError> {
    addr.parse()
        .map_err(|e| NotifyError::Param(format!("invalid {} address {}: {}", field, addr, e)))
}

fn attachment_part(attachment: &EmailAttachment) -> Result<SinglePart, NotifyError> {
    let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
        NotifyError::Param(format!(
            "invalid content type {}: {}",
            attachment.content_type, e
        ))
    })?;
    Ok(Attachment::new(attachment.file_name.clone()).body(attachment.data.clone(), content_type))
}

/// # Summary
/// Builds the SMTP session for sending `msg` with `account`.
///
/// # Logic
/// 1. Sender is `account.from`, falling back to the SMTP username.
/// 2. Recipients, reply-to and subject map onto the envelope and headers.
/// 3. The body is plain text or HTML; attachments turn it into `multipart/mixed`.
///
/// # Returns
/// * `NotifyError::Param` for unparseable addresses or content types.
/// * `NotifyError::Config` when the account has no host.
pub fn build_session(account: &EmailAccount, msg: &EmailMessage) -> Result<SmtpSession, NotifyError> {
    if account.host.is_empty() {
        return Err(NotifyError::Config(format!(
            "email account {} has no SMTP host",
            account.account.name
        )));
    }
    let username = account.account.credentials.key.clone();
    let from = if account.from.is_empty() {
        username.as_str()
    } else {
        account.from.as_str()
    };

    let mut builder = lettre::Message::builder()
        .from(mailbox("from", from)?)
        .subject(msg.subject.as_str());
    for addr in &msg.to {
        builder = builder.to(mailbox("to", addr)?);
    }
    for addr in &msg.cc {
        builder = builder.cc(mailbox("cc", addr)?);
    }
    for addr in &msg.bcc {
        builder = builder.bcc(mailbox("bcc", addr)?);
    }
    if let Some(addr) = &msg.reply_to {
        builder = builder.reply_to(mailbox("reply_to", addr)?);
    }

    let content_type = if msg.html {
        ContentType::TEXT_HTML
    } else {
        ContentType::TEXT_PLAIN
    };
    let body = SinglePart::builder()
        .header(content_type)
        .body(msg.body.clone());

    let built = if msg.attachments.is_empty() {
        builder.singlepart(body)
    } else {
        let mut parts = MultiPart::mixed().singlepart(body);
        for attachment in &msg.attachments {
            parts = parts.singlepart(attachment_part(attachment)?);
        }
        builder.multipart(parts)
    };
    let built = built.map_err(|e| NotifyError::Param(format!("failed to build email: {}", e)))?;

    Ok(SmtpSession {
        host: account.host.clone(),
        port: account.port,
        tls: TlsPolicy::for_port(account.port),
        username,
        password: account.account.secret().map(str::to_string),
        message: built,
    })
}

/// # Summary
/// Delivers a prepared SMTP session.
///
/// # Returns
/// * The SMTP reply code of the final command.
/// * `NotifyError::Network` for connection, TLS or protocol failures.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn deliver(&self, session: SmtpSession) -> Result<u16, NotifyError>;
}

/// `Mailer` backed by lettre's async SMTP transport.
pub struct LettreMailer {
    timeout: Option<Duration>,
}

impl LettreMailer {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn transport(&self, session: &SmtpSession) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let builder = match session.tls {
            TlsPolicy::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&session.host)
                .map_err(|e| NotifyError::Config(format!("invalid SMTP host {}: {}", session.host, e)))?,
            TlsPolicy::Opportunistic => {
                let params = TlsParameters::new(session.host.clone())
                    .map_err(|e| NotifyError::Config(format!("invalid SMTP host {}: {}", session.host, e)))?;
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&session.host)
                    .tls(Tls::Opportunistic(params))
            }
        };
        let builder = builder.port(session.port).timeout(self.timeout);
        let builder = if session.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                session.username.clone(),
                session.password.clone().unwrap_or_default(),
            ))
        };
        Ok(builder.build())
    }
}

/// # Summary
/// Maps a failed SMTP transaction to a transport error, keeping the reply code.
///
/// # Invariants
/// - Failures of the closing exchange never reach this point: without connection pooling
///   lettre aborts the connection after the server accepted `DATA` and discards the
///   reply to `QUIT`. Every error seen here is a rejection of the mail itself.
pub fn smtp_failure(code: Option<u16>, detail: &str) -> NotifyError {
    match code {
        Some(code) => NotifyError::Network(format!("SMTP error {}: {}", code, detail)),
        None => NotifyError::Network(format!("SMTP error: {}", detail)),
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn deliver(&self, session: SmtpSession) -> Result<u16, NotifyError> {
        let transport = self.transport(&session)?;
        match transport.send(session.message).await {
            Ok(response) => Ok(response.code().to_string().parse().unwrap_or(250)),
            Err(e) => {
                let code = e.status().and_then(|c| c.to_string().parse().ok());
                warn!(host = %session.host, code = ?code, error = %e, "SMTP transaction failed");
                Err(smtp_failure(code, &e.to_string()))
            }
        }
    }
}

/// # Summary
/// Email provider: selects an SMTP account, builds the session and hands it to a `Mailer`.
///
/// # Invariants
/// - The per-call HTTP client override in `SendOptions` does not apply here.
pub struct EmailProvider {
    selector: Selector<EmailAccount>,
    mailer: Arc<dyn Mailer>,
}

impl EmailProvider {
    pub fn new(pool: PoolConfig<EmailAccount>, mailer: Arc<dyn Mailer>) -> Result<Self, NotifyError> {
        let selector =
            Selector::from_pool(pool).map_err(|e| e.with_context(ProviderType::Email, None))?;
        Ok(Self { selector, mailer })
    }

    /// Provider delivering through lettre.
    pub fn with_lettre(pool: PoolConfig<EmailAccount>, timeout: Option<Duration>) -> Result<Self, NotifyError> {
        Self::new(pool, Arc::new(LettreMailer::new(timeout)))
    }

    async fn deliver(
        &self,
        ctx: &SendContext,
        msg: &EmailMessage,
        account: &EmailAccount,
    ) -> Result<SendResult, NotifyError> {
        if ctx.is_cancelled() {
            return Err(NotifyError::Cancelled);
        }
        let session = build_session(account, msg)?;
        debug!(
            account = %account.account.name,
            host = %session.host,
            port = session.port,
            tls = ?session.tls,
            "SMTP session built"
        );

        let code = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(NotifyError::Cancelled),
            code = self.mailer.deliver(session) => code?,
        };
        Ok(SendResult {
            status_code: code,
            raw_body: Vec::new(),
            metadata: HashMap::new(),
        })
    }
}

#[async_trait]
impl Provider for EmailProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Email
    }

    async fn send(
        &self,
        ctx: &SendContext,
        msg: &mut Message,
        _opts: &SendOptions,
    ) -> Result<SendResult, NotifyError> {
        let provider = ProviderType::Email;
        let email = match &*msg {
            Message::Email(email) => email,
            other => return Err(mismatch(provider, other).with_context(provider, None)),
        };
        email.validate().map_err(|e| e.with_context(provider, None))?;
        let account = self
            .selector
            .select(ctx)
            .map_err(|e| e.with_context(provider, None))?;

        let result = self
            .deliver(ctx, email, account)
            .await
            .map_err(|e| e.with_context(provider, Some(&account.account.name)))?;
        info!(
            provider = %provider,
            account = %account.account.name,
            recipients = email.recipients().count(),
            "email sent"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::notify::entity::Account;
    use courier_core::notify::error::ErrorKind;

    fn account(port: u16) -> EmailAccount {
        EmailAccount::new(
            Account::new("smtp", "bot@example.com").with_secret("pw"),
            "smtp.example.com",
            port,
            "Courier <bot@example.com>",
        )
    }

    #[test]
    fn test_tls_policy_by_port() {
        assert_eq!(TlsPolicy::for_port(465), TlsPolicy::Implicit);
        assert_eq!(TlsPolicy::for_port(587), TlsPolicy::Opportunistic);
        assert_eq!(TlsPolicy::for_port(25), TlsPolicy::Opportunistic);
        assert_eq!(TlsPolicy::for_port(2525), TlsPolicy::Opportunistic);
    }

    #[test]
    fn test_session_fields_and_headers() {
        let msg = EmailMessage::new("Deploy finished", "all green")
            .to("ops@example.com")
            .cc("dev@example.com")
            .bcc("audit@example.com");
        let session = build_session(&account(465), &msg).unwrap();
        assert_eq!(session.host, "smtp.example.com");
        assert_eq!(session.tls, TlsPolicy::Implicit);
        assert_eq!(session.username, "bot@example.com");
        assert_eq!(session.password.as_deref(), Some("pw"));

        let envelope = session.message.envelope();
        assert_eq!(envelope.to().len(), 3);

        let raw = String::from_utf8(session.message.formatted()).unwrap();
        assert!(raw.contains("Subject: Deploy finished"));
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Cc: dev@example.com"));
        assert!(!raw.contains("audit@example.com"));
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn test_html_with_attachment_is_multipart() {
        let msg = EmailMessage::new("Report", "<b>ok</b>")
            .to("ops@example.com")
            .html()
            .attach(EmailAttachment::new("r.csv", "text/csv", b"a,b".to_vec()));
        let session = build_session(&account(587), &msg).unwrap();
        let raw = String::from_utf8(session.message.formatted()).unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("r.csv"));
    }

    #[test]
    fn test_missing_host_is_config_error() {
        let mut acct = account(587);
        acct.host.clear();
        let msg = EmailMessage::new("s", "b").to("a@example.com");
        assert!(matches!(build_session(&acct, &msg), Err(NotifyError::Config(_))));
    }

    #[test]
    fn test_smtp_rejection_is_never_swallowed() {
        let err = smtp_failure(Some(550), "5.7.1 message rejected, RSET and try again");
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(
            err.to_string(),
            "Network error: SMTP error 550: 5.7.1 message rejected, RSET and try again"
        );

        let err = smtp_failure(None, "connection reset by peer");
        assert!(matches!(err, NotifyError::Network(m) if m == "SMTP error: connection reset by peer"));
    }
}
