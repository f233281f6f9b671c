use crate::common::ProviderType;
use thiserror::Error;

/// # Summary
/// 机器可读的错误类别，供调用方决定是否重试或如何提示用户。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // 参数或消息校验失败，不可重试
    Param,
    // Provider 未配置、无可用账号、指定账号不存在
    Config,
    // 网络 I/O、超时、取消、SMTP 失败，可能是暂时性的
    Transport,
    // 平台返回了非成功的业务码
    Api,
    // 发送前的媒体上传失败
    Upload,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Param => "param",
            ErrorKind::Config => "config",
            ErrorKind::Transport => "transport",
            ErrorKind::Api => "api",
            ErrorKind::Upload => "upload",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Summary
/// 通知服务错误枚举。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - `Dispatch` 只包裹一层，由 Provider 外壳在出错时附加 Provider 标签与账号名。
#[derive(Error, Debug)]
pub enum NotifyError {
    /// 消息校验失败或缺少必需的账号凭据
    #[error("Parameter error: {0}")]
    Param(String),

    /// 配置错误 (如 Provider 被禁用、无可用账号)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 网络连接或传输错误
    #[error("Network error: {0}")]
    Network(String),

    /// 调用方在请求完成前取消了发送
    #[error("Request cancelled")]
    Cancelled,

    /// 推送平台返回的错误 (如 Telegram `ok=false`、钉钉 `errcode!=0`)
    #[error("Platform error [{}]: {message}", display_code(.code))]
    Platform { code: Option<i64>, message: String },

    /// 媒体上传失败
    #[error("Upload error: {0}")]
    Upload(String),

    /// 附带 Provider 与账号上下文的错误
    #[error("{provider} (account: {}): {source}", .account.as_deref().unwrap_or("-"))]
    Dispatch {
        provider: ProviderType,
        account: Option<String>,
        source: Box<NotifyError>,
    },
}

fn display_code(code: &Option<i64>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl NotifyError {
    /// # Summary
    /// 返回错误类别，穿透 `Dispatch` 包裹。
    pub fn kind(&self) -> ErrorKind {
        match self {
            NotifyError::Param(_) => ErrorKind::Param,
            NotifyError::Config(_) => ErrorKind::Config,
            NotifyError::Network(_) | NotifyError::Cancelled => ErrorKind::Transport,
            NotifyError::Platform { .. } => ErrorKind::Api,
            NotifyError::Upload(_) => ErrorKind::Upload,
            NotifyError::Dispatch { source, .. } => source.kind(),
        }
    }

    /// 返回最内层的错误
    pub fn root(&self) -> &NotifyError {
        match self {
            NotifyError::Dispatch { source, .. } => source.root(),
            other => other,
        }
    }

    /// 出错的 Provider 标签 (若已附加)
    pub fn provider(&self) -> Option<ProviderType> {
        match self {
            NotifyError::Dispatch { provider, .. } => Some(*provider),
            _ => None,
        }
    }

    /// 出错时选中的账号名 (若已选中)
    pub fn account(&self) -> Option<&str> {
        match self {
            NotifyError::Dispatch { account, .. } => account.as_deref(),
            _ => None,
        }
    }

    /// # Summary
    /// 为错误附加 Provider 与账号上下文。
    ///
    /// # Logic
    /// 1. 已经是 `Dispatch` 的错误原样返回，避免重复包裹。
    /// 2. 其余错误包裹为 `Dispatch`。
    pub fn with_context(self, provider: ProviderType, account: Option<&str>) -> Self {
        match self {
            NotifyError::Dispatch { .. } => self,
            other => NotifyError::Dispatch {
                provider,
                account: account.map(str::to_string),
                source: Box::new(other),
            },
        }
    }
}
