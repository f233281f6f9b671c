//! # courier-notify
//!
//! Provider implementations for `courier-core`: account selection, request signing,
//! response classification, the reqwest transport, the DingTalk / WeCom / Telegram
//! transformers, WeCom media upload, SMTP delivery and the provider registry.

pub mod dingtalk;
pub mod dispatcher;
pub mod email;
pub mod http;
pub mod provider;
pub mod response;
pub mod selector;
pub mod signer;
pub mod telegram;
pub mod uploader;
pub mod wecom;

pub use dispatcher::Dispatcher;
pub use provider::{HttpCall, HttpProvider, Transformer};
