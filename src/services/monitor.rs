//! 投递健康监控 - 业务能力层
//!
//! 熔断器 + 限流 + 每日费用上限，回答"引擎还能不能继续"。
//! 由引擎持有（`&mut`），一次运行一个实例；多平台并行部署时
//! 需要每个平台一个实例，或在外层加锁串行化 `record_attempt`。
//!
//! 限流窗口是滚动窗口：最近 60 分钟 / 最近 24 小时

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::{info, warn};

use crate::models::{AttemptResult, MonitorDecision, RateLimitConfig};

/// 全局连续失败阈值
pub const CONSECUTIVE_FAILURE_LIMIT: u32 = 3;
/// 单平台连续失败阈值
pub const PLATFORM_FAILURE_LIMIT: u32 = 3;

/// 时间来源，测试中可替换
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    at: DateTime<Utc>,
    cost_usd: f64,
}

/// 投递健康监控器
pub struct ApplyMonitor {
    config: RateLimitConfig,
    clock: Box<dyn Clock>,
    consecutive_failures: u32,
    platform_failures: HashMap<String, u32>,
    disabled: BTreeSet<String>,
    ledger: VecDeque<LedgerEntry>,
}

impl ApplyMonitor {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: RateLimitConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            consecutive_failures: 0,
            platform_failures: HashMap::new(),
            disabled: BTreeSet::new(),
            ledger: VecDeque::new(),
        }
    }

    /// 记录一次投递并返回最新的健康快照
    ///
    /// 成功类结果清零全局计数和该平台计数（已禁用的平台仍需手动重置）；
    /// 失败类结果两者都加一；验证码既不清零也不累加
    pub fn record_attempt(&mut self, result: &AttemptResult, platform: &str) -> MonitorDecision {
        let now = self.clock.now();
        let platform = platform.to_lowercase();

        self.prune(now);
        self.ledger.push_back(LedgerEntry {
            at: now,
            cost_usd: result.cost_usd,
        });

        if result.status.is_success_like() {
            self.consecutive_failures = 0;
            self.platform_failures.insert(platform.clone(), 0);
        } else if result.status.is_failure_like() {
            self.consecutive_failures += 1;
            let count = self.platform_failures.entry(platform.clone()).or_insert(0);
            *count += 1;
            if *count >= PLATFORM_FAILURE_LIMIT && self.disabled.insert(platform.clone()) {
                warn!("⛔ 平台 {} 连续失败 {} 次，已禁用", platform, count);
            }
        }

        let decision = self.check_health();
        if !decision.should_continue {
            warn!(
                "⛔ 监控器要求暂停: {}",
                decision.pause_reason.as_deref().unwrap_or_default()
            );
        }
        decision
    }

    /// 当前健康快照，不修改任何状态
    pub fn check_health(&self) -> MonitorDecision {
        let now = self.clock.now();
        let hour_ago = now - ChronoDuration::hours(1);
        let day_ago = now - ChronoDuration::hours(24);

        let mut hourly_count = 0u32;
        let mut daily_count = 0u32;
        let mut daily_cost_usd = 0.0;
        for entry in self.ledger.iter().filter(|e| e.at > day_ago) {
            daily_count += 1;
            daily_cost_usd += entry.cost_usd;
            if entry.at > hour_ago {
                hourly_count += 1;
            }
        }

        let mut pause_reason = None;
        let mut alerts = Vec::new();

        if self.consecutive_failures >= CONSECUTIVE_FAILURE_LIMIT {
            let reason = format!(
                "{} consecutive failures (circuit breaker open)",
                self.consecutive_failures
            );
            alerts.push(format!(
                "Human-in-the-loop intervention required: {}. Check selectors and recent errors, then reset the circuit breaker.",
                reason
            ));
            pause_reason = Some(reason);
        }

        if daily_cost_usd >= self.config.max_cost_per_day_usd {
            let reason = format!(
                "Daily cost cap reached: ${:.2} of ${:.2}",
                daily_cost_usd, self.config.max_cost_per_day_usd
            );
            alerts.push(format!("Spending halted. {}", reason));
            pause_reason.get_or_insert(reason);
        }

        if daily_count >= self.config.max_per_day {
            pause_reason.get_or_insert(format!(
                "Daily limit reached: {}/{} applications in the last 24h",
                daily_count, self.config.max_per_day
            ));
        }

        if hourly_count >= self.config.max_per_hour {
            pause_reason.get_or_insert(format!(
                "Hourly limit reached: {}/{} applications in the last hour",
                hourly_count, self.config.max_per_hour
            ));
        }

        if !self.disabled.is_empty() {
            let names: Vec<&str> = self.disabled.iter().map(String::as_str).collect();
            alerts.push(format!(
                "Platform(s) disabled after {} consecutive failures: {}. Reset required before retrying.",
                PLATFORM_FAILURE_LIMIT,
                names.join(", ")
            ));
        }

        MonitorDecision {
            should_continue: pause_reason.is_none(),
            pause_reason,
            platform_disabled: self.disabled.clone(),
            consecutive_failures: self.consecutive_failures,
            daily_count,
            hourly_count,
            daily_cost_usd,
            alert_message: (!alerts.is_empty()).then(|| alerts.join(" | ")),
        }
    }

    /// 运维操作：清零平台计数并解除禁用
    pub fn reset_platform(&mut self, platform: &str) {
        let platform = platform.to_lowercase();
        self.platform_failures.remove(&platform);
        if self.disabled.remove(&platform) {
            info!("✓ 平台 {} 已重新启用", platform);
        }
    }

    /// 运维操作：清零全局连续失败计数
    pub fn reset_circuit_breaker(&mut self) {
        if self.consecutive_failures > 0 {
            info!("✓ 熔断器已重置 (之前连续失败 {} 次)", self.consecutive_failures);
        }
        self.consecutive_failures = 0;
    }

    pub fn platform_failures(&self, platform: &str) -> u32 {
        self.platform_failures
            .get(&platform.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// 丢弃 24 小时之前的记录
    fn prune(&mut self, now: DateTime<Utc>) {
        let day_ago = now - ChronoDuration::hours(24);
        while self.ledger.front().is_some_and(|e| e.at <= day_ago) {
            self.ledger.pop_front();
        }
    }
}
