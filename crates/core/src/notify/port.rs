use crate::common::ProviderType;
use crate::message::Message;
use crate::notify::entity::{SendContext, SendOptions, SendResult};
use crate::notify::error::NotifyError;
use crate::notify::request::{HttpRequestSpec, HttpResponse};
use async_trait::async_trait;

/// # Summary
/// 执行 `HttpRequestSpec` 的传输层接口。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持并发调用。
/// - 只负责传输，不解释响应体；非 2xx 状态码同样以 `Ok` 返回。
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// # Summary
    /// 发出一次 HTTP 请求。
    ///
    /// # Arguments
    /// * `request` - 由 Transformer 生成的请求描述。
    ///
    /// # Returns
    /// * 成功返回状态码与响应体。
    /// * I/O 失败或超时返回 `NotifyError::Network`。
    async fn execute(&self, request: HttpRequestSpec) -> Result<HttpResponse, NotifyError>;
}

/// # Summary
/// 发送通知到外部平台的接口定义。
///
/// # Invariants
/// - 实现必须是 `Send` 和 `Sync` 以支持并发调用。
/// - 除选号计数器外不持有任何单次调用的可变状态。
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider 对应的平台
    fn provider_type(&self) -> ProviderType;

    /// Provider 标签
    fn name(&self) -> &str {
        self.provider_type().as_str()
    }

    /// # Summary
    /// 发送一条消息。
    ///
    /// # Logic
    /// 1. 校验消息。
    /// 2. 按上下文或策略选择账号。
    /// 3. 转换为平台请求 (必要时先上传媒体并回填 `media_id`)。
    /// 4. 执行请求并判定结果。
    ///
    /// # Arguments
    /// * `ctx` - 调用上下文 (指定账号、取消令牌)。
    /// * `msg` - 待发送消息，上传媒体后可能被回填一次。
    /// * `opts` - 单次发送的可选项。
    ///
    /// # Returns
    /// * 成功返回 `SendResult`。
    /// * 失败返回附带 Provider 与账号上下文的 `NotifyError`。
    async fn send(
        &self,
        ctx: &SendContext,
        msg: &mut Message,
        opts: &SendOptions,
    ) -> Result<SendResult, NotifyError>;
}
