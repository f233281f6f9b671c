use async_trait::async_trait;
use courier_core::common::ProviderType;
use courier_core::config::{AppConfig, PoolConfig, Strategy};
use courier_core::message::{DingTalkMessage, EmailMessage, Message, TelegramMessage, WeComMessage};
use courier_core::notify::entity::{Account, EmailAccount, SendContext, SendOptions};
use courier_core::notify::error::{ErrorKind, NotifyError};
use courier_core::notify::port::Provider;
use courier_core::testing::RecordingHttpClient;
use courier_notify::Dispatcher;
use courier_notify::email::{EmailProvider, Mailer, SmtpSession, TlsPolicy};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingMailer {
    sessions: Mutex<Vec<SmtpSession>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn deliver(&self, session: SmtpSession) -> Result<u16, NotifyError> {
        self.sessions.lock().unwrap().push(session);
        Ok(250)
    }
}

struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn deliver(&self, _session: SmtpSession) -> Result<u16, NotifyError> {
        Err(NotifyError::Network("SMTP error: connection refused".into()))
    }
}

fn smtp_pool() -> PoolConfig<EmailAccount> {
    PoolConfig::new(
        Strategy::RoundRobin,
        vec![
            EmailAccount::new(
                Account::new("primary", "bot@example.com").with_secret("pw1"),
                "smtp.example.com",
                465,
                "",
            ),
            EmailAccount::new(
                Account::new("backup", "relay@example.org").with_secret("pw2"),
                "mail.example.org",
                587,
                "Alerts <alerts@example.org>",
            ),
        ],
    )
}

fn report() -> Message {
    Message::from(EmailMessage::new("Nightly report", "all green").to("ops@example.com"))
}

#[tokio::test]
async fn test_email_provider_rotates_accounts() {
    let mailer = Arc::new(RecordingMailer::default());
    let provider = EmailProvider::new(smtp_pool(), mailer.clone()).unwrap();

    for _ in 0..2 {
        let result = provider
            .send(&SendContext::new(), &mut report(), &SendOptions::default())
            .await
            .unwrap();
        assert_eq!(result.status_code, 250);
    }

    let sessions = mailer.sessions.lock().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].host, "smtp.example.com");
    assert_eq!(sessions[0].tls, TlsPolicy::Implicit);
    assert_eq!(sessions[0].username, "bot@example.com");
    assert_eq!(sessions[1].tls, TlsPolicy::Opportunistic);
    assert_eq!(sessions[1].password.as_deref(), Some("pw2"));

    let raw = String::from_utf8(sessions[1].message.formatted()).unwrap();
    assert!(raw.contains("alerts@example.org"));
}

#[tokio::test]
async fn test_email_validation_and_context() {
    let mailer = Arc::new(RecordingMailer::default());
    let provider = EmailProvider::new(smtp_pool(), mailer.clone()).unwrap();

    let mut no_recipient = Message::from(EmailMessage::new("subject", "body"));
    let err = provider
        .send(&SendContext::new(), &mut no_recipient, &SendOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Param);
    assert!(mailer.sessions.lock().unwrap().is_empty());

    let failing = EmailProvider::new(smtp_pool(), Arc::new(FailingMailer)).unwrap();
    let err = failing
        .send(
            &SendContext::new().with_account("backup"),
            &mut report(),
            &SendOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.provider(), Some(ProviderType::Email));
    assert_eq!(err.account(), Some("backup"));
}

#[tokio::test]
async fn test_email_cancelled_before_delivery() {
    let mailer = Arc::new(RecordingMailer::default());
    let provider = EmailProvider::new(smtp_pool(), mailer.clone()).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let err = provider
        .send(&SendContext::new().with_cancel(token), &mut report(), &SendOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err.root(), NotifyError::Cancelled));
    assert!(mailer.sessions.lock().unwrap().is_empty());
}

fn http_config() -> AppConfig {
    let pool = |key: &str| PoolConfig::new(Strategy::RoundRobin, vec![Account::new("main", key)]);
    let mut disabled = pool("W");
    disabled.disabled = true;
    AppConfig {
        dingtalk: Some(pool("D")),
        wecom: Some(disabled),
        telegram: Some(pool("T")),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_dispatcher_routes_by_platform() {
    let client = Arc::new(RecordingHttpClient::new());
    client
        .push_json(json!({"ok": true}))
        .push_json(json!({"errcode": 0}));
    let dispatcher = Dispatcher::from_config_with_client(&http_config(), client.clone()).unwrap();

    assert_eq!(
        dispatcher.registered(),
        vec![ProviderType::DingTalk, ProviderType::Telegram]
    );

    let ctx = SendContext::new();
    let opts = SendOptions::default();
    dispatcher
        .send(&ctx, &mut Message::from(TelegramMessage::text("1", "a")), &opts)
        .await
        .unwrap();
    dispatcher
        .send(&ctx, &mut Message::from(DingTalkMessage::text("b")), &opts)
        .await
        .unwrap();

    let requests = client.requests();
    assert!(requests[0].url.starts_with("https://api.telegram.org/botT/"));
    assert!(requests[1].url.starts_with("https://oapi.dingtalk.com/robot/send"));
}

#[tokio::test]
async fn test_unconfigured_platform_is_config_error() {
    let client = Arc::new(RecordingHttpClient::new());
    let dispatcher = Dispatcher::from_config_with_client(&http_config(), client.clone()).unwrap();

    let err = dispatcher
        .send(
            &SendContext::new(),
            &mut Message::from(WeComMessage::text("x")),
            &SendOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(err.provider(), Some(ProviderType::WeCom));
    assert_eq!(client.request_count(), 0);
}

#[tokio::test]
async fn test_registering_custom_provider() {
    let dispatcher = Dispatcher::new();
    let mailer = Arc::new(RecordingMailer::default());
    dispatcher.register(Arc::new(EmailProvider::new(smtp_pool(), mailer.clone()).unwrap()));

    dispatcher
        .send(&SendContext::new(), &mut report(), &SendOptions::default())
        .await
        .unwrap();
    assert_eq!(mailer.sessions.lock().unwrap().len(), 1);
    assert!(dispatcher.provider(ProviderType::Email).is_some());
    assert!(dispatcher.provider(ProviderType::Telegram).is_none());
}

#[test]
fn test_pool_without_enabled_accounts_fails() {
    let mut config = http_config();
    config.telegram = Some(PoolConfig::new(
        Strategy::Random,
        vec![Account::new("off", "T").disabled()],
    ));
    let err = Dispatcher::from_config_with_client(&config, Arc::new(RecordingHttpClient::new()))
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Config);
}
