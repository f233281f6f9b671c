//! # courier-core
//!
//! 通知分发引擎的领域层：账号、账号池配置、消息模型、请求描述以及各端口 (Port) 定义。
//! 本 crate 不包含任何网络实现，具体的 HTTP / SMTP 适配器位于 `courier-notify`。

pub mod common;
pub mod config;
pub mod message;
pub mod notify;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
