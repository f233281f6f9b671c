use crate::notify::entity::{Account, EmailAccount};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 选号策略。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    // 按插入顺序轮询
    #[default]
    RoundRobin,
    // 均匀随机
    Random,
    // 按权重随机
    Weighted,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "round_robin" | "roundrobin" | "" => Ok(Strategy::RoundRobin),
            "random" => Ok(Strategy::Random),
            "weighted" | "weighted_random" => Ok(Strategy::Weighted),
            _ => Err(format!("Unknown Strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::RoundRobin => write!(f, "round_robin"),
            Strategy::Random => write!(f, "random"),
            Strategy::Weighted => write!(f, "weighted"),
        }
    }
}

/// # Summary
/// 单个 Provider 的账号池配置。
///
/// # Invariants
/// - `disabled = true` 或没有启用账号时，Provider 构造失败。
/// - `accounts` 的顺序即轮询顺序。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolConfig<A = Account> {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub strategy: Strategy,
    // 覆盖平台默认的接口地址 (代理或本地测试服务)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "Vec::new")]
    pub accounts: Vec<A>,
}

impl<A> Default for PoolConfig<A> {
    fn default() -> Self {
        Self {
            disabled: false,
            strategy: Strategy::RoundRobin,
            base_url: None,
            accounts: Vec::new(),
        }
    }
}

impl<A> PoolConfig<A> {
    pub fn new(strategy: Strategy, accounts: Vec<A>) -> Self {
        Self {
            strategy,
            accounts,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// HTTP 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    // 单次请求超时 (秒)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 全局应用配置，未出现的平台节表示不启用该平台
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub dingtalk: Option<PoolConfig>,
    #[serde(default)]
    pub wecom: Option<PoolConfig>,
    #[serde(default)]
    pub telegram: Option<PoolConfig>,
    #[serde(default)]
    pub email: Option<PoolConfig<EmailAccount>>,
}
