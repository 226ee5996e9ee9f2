use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 限流与费用阈值
///
/// 默认值：每小时 10 次、每天 50 次、每天 5 美元
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_per_hour: u32,
    pub max_per_day: u32,
    pub max_cost_per_day_usd: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_hour: 10,
            max_per_day: 50,
            max_cost_per_day_usd: 5.0,
        }
    }
}

/// 监控器在某一时刻的健康快照
///
/// 值对象，不做持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorDecision {
    pub should_continue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_reason: Option<String>,
    pub platform_disabled: BTreeSet<String>,
    pub consecutive_failures: u32,
    pub daily_count: u32,
    pub hourly_count: u32,
    pub daily_cost_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_message: Option<String>,
}

impl MonitorDecision {
    pub fn is_platform_disabled(&self, platform: &str) -> bool {
        self.platform_disabled.contains(&platform.to_lowercase())
    }
}
