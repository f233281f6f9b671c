use anyhow::{Context, bail};
use courier_core::common::ProviderType;
use courier_core::config::AppConfig;
use courier_core::message::{DingTalkMessage, EmailMessage, Message, TelegramMessage, WeComMessage};
use courier_core::notify::entity::{SendContext, SendOptions};
use courier_notify::Dispatcher;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  courier-app dingtalk <text>
  courier-app wecom <text>
  courier-app telegram <chat_id> <text>
  courier-app email <to> <subject> <body>

environment:
  COURIER_ACCOUNT   pin the account used for this send";

/// # Summary
/// 读取配置：`courier.toml` (可选) 叠加 `COURIER__` 前缀的环境变量。
///
/// 例如 `COURIER__HTTP__TIMEOUT_SECS=5` 覆盖 `[http] timeout_secs`。
fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("courier").required(false))
        .add_source(
            config::Environment::with_prefix("COURIER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to load configuration")?;
    settings
        .try_deserialize()
        .context("invalid configuration")
}

/// # Summary
/// 由命令行参数构造一条消息。
fn build_message(args: &[String]) -> anyhow::Result<Message> {
    let Some((platform, rest)) = args.split_first() else {
        bail!("{}", USAGE);
    };
    let platform: ProviderType = platform
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}\n\n{}", e, USAGE))?;

    let msg = match (platform, rest) {
        (ProviderType::DingTalk, [text]) => Message::from(DingTalkMessage::text(text.as_str())),
        (ProviderType::WeCom, [text]) => Message::from(WeComMessage::text(text.as_str())),
        (ProviderType::Telegram, [chat_id, text]) => {
            Message::from(TelegramMessage::text(chat_id.as_str(), text.as_str()))
        }
        (ProviderType::Email, [to, subject, body]) => {
            Message::from(EmailMessage::new(subject.as_str(), body.as_str()).to(to.as_str()))
        }
        _ => bail!("wrong arguments for {}\n\n{}", platform, USAGE),
    };
    Ok(msg)
}

/// # Summary
/// 命令行入口，同时是依赖注入的根。
///
/// # Logic
/// 1. 初始化日志 (`RUST_LOG`，缺省 `info`)。
/// 2. 加载配置并构造 Dispatcher。
/// 3. 由参数构造消息，Ctrl-C 取消发送。
/// 4. 发送并输出结果。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 2. 配置与 Dispatcher
    let config = load_config()?;
    let dispatcher = Dispatcher::from_config(&config)?;

    // 3. 消息与取消令牌
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut msg = build_message(&args)?;

    let token = CancellationToken::new();
    let mut ctx = SendContext::new().with_cancel(token.clone());
    if let Ok(account) = std::env::var("COURIER_ACCOUNT") {
        ctx = ctx.with_account(account);
    }
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling send");
            token.cancel();
        }
    });

    // 4. 发送
    let result = dispatcher.send(&ctx, &mut msg, &SendOptions::default()).await?;
    info!(
        provider = %msg.provider_type(),
        msg_type = msg.msg_type(),
        status = result.status_code,
        body = %result.body_text(),
        "done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_message() {
        let msg = build_message(&args(&["telegram", "100", "hello"])).unwrap();
        assert_eq!(msg, Message::from(TelegramMessage::text("100", "hello")));

        let msg = build_message(&args(&["smtp", "a@b.com", "hi", "body"])).unwrap();
        assert_eq!(msg.provider_type(), ProviderType::Email);

        assert!(build_message(&args(&[])).is_err());
        assert!(build_message(&args(&["fax", "x"])).is_err());
        assert!(build_message(&args(&["telegram", "only-one"])).is_err());
    }
}
