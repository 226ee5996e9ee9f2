//! 自动投递引擎 - 编排层
//!
//! 一次只驱动一个页面，按队列顺序逐条处理：
//! 选择 Runner → 询问监控器 → 投递 → 记录 → 持久化 → 告警 → 继续或暂停
//!
//! 只有监控器的"不可继续"决定会改变循环的控制流，
//! 其余所有失败都已经被 Runner 折算成带类型的投递结果

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::infrastructure::FormPage;
use crate::models::{ApplicationTask, AttemptResult, AttemptStatus, MonitorDecision};
use crate::platforms::{Platform, RunnerSet};
use crate::services::{AnswerBank, ApplyMonitor, AttemptRecord, AttemptSink, Notifier};
use crate::workflow::{ApplyCtx, ApplySettings};

/// 单条申请在本次运行中的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    Attempted(AttemptStatus),
    NoRunner,
    PlatformDisabled,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub applied_verified: usize,
    pub applied_soft: usize,
    pub failed: usize,
    pub paused: usize,
    pub skipped_no_runner: usize,
    pub skipped_disabled: usize,
    /// 引擎暂停的原因（监控器给出的 pause_reason）
    pub halted_reason: Option<String>,
    pub cancelled: bool,
    /// 按处理顺序记录 (申请 ID, 去向)
    pub outcomes: Vec<(String, TaskOutcome)>,
}

impl RunSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    fn record(&mut self, task: &ApplicationTask, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Attempted(AttemptStatus::AppliedVerified) => self.applied_verified += 1,
            TaskOutcome::Attempted(AttemptStatus::AppliedSoft) => self.applied_soft += 1,
            TaskOutcome::Attempted(AttemptStatus::FailedPermanent) => self.failed += 1,
            TaskOutcome::Attempted(_) => self.paused += 1,
            TaskOutcome::NoRunner => self.skipped_no_runner += 1,
            TaskOutcome::PlatformDisabled => self.skipped_disabled += 1,
        }
        self.outcomes.push((task.id.clone(), outcome));
    }

    pub fn attempted(&self) -> usize {
        self.applied_verified + self.applied_soft + self.failed + self.paused
    }

    /// 未处理的申请数（暂停或取消后剩下的）
    pub fn not_started(&self) -> usize {
        self.total - self.outcomes.len()
    }

    pub fn outcome_of(&self, application_id: &str) -> Option<TaskOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| id == application_id)
            .map(|(_, outcome)| *outcome)
    }
}

/// 自动投递引擎
pub struct AutoApplyEngine {
    runners: RunnerSet,
    answers: AnswerBank,
    monitor: ApplyMonitor,
    settings: ApplySettings,
    sink: Box<dyn AttemptSink>,
    notifiers: Vec<Box<dyn Notifier>>,
    /// 在两次投递之间检查，不会打断进行中的投递
    cancel: CancellationToken,
    last_alert: Option<String>,
}

impl AutoApplyEngine {
    pub fn new(
        runners: RunnerSet,
        answers: AnswerBank,
        monitor: ApplyMonitor,
        settings: ApplySettings,
        sink: Box<dyn AttemptSink>,
    ) -> Self {
        Self {
            runners,
            answers,
            monitor,
            settings,
            sink,
            notifiers: Vec::new(),
            cancel: CancellationToken::new(),
            last_alert: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// 外部（如 Ctrl+C 处理）持有的停止令牌
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 已加载配置的平台
    pub fn platforms(&self) -> Vec<Platform> {
        self.runners.platforms()
    }

    pub fn monitor(&self) -> &ApplyMonitor {
        &self.monitor
    }

    /// 运维操作入口：重置平台或熔断器
    pub fn monitor_mut(&mut self) -> &mut ApplyMonitor {
        &mut self.monitor
    }

    /// 运维操作后重新检查是否可以继续
    pub fn resume(&mut self) -> MonitorDecision {
        let decision = self.monitor.check_health();
        if decision.should_continue {
            info!("✓ 监控器允许继续投递");
            self.last_alert = None;
        } else {
            warn!(
                "⚠️ 仍不能继续: {}",
                decision.pause_reason.as_deref().unwrap_or_default()
            );
        }
        decision
    }

    /// 按顺序处理队列
    pub async fn run<P: FormPage + ?Sized>(
        &mut self,
        page: &P,
        tasks: &[ApplicationTask],
    ) -> RunSummary {
        let mut summary = RunSummary::new(tasks.len());

        for (idx, task) in tasks.iter().enumerate() {
            let index = idx + 1;

            if self.cancel.is_cancelled() {
                info!("🛑 收到停止信号，剩余 {} 条申请未处理", tasks.len() - idx);
                summary.cancelled = true;
                break;
            }

            let Some(runner) = self.runners.detect(&task.job_url) else {
                warn!(
                    "[申请 {} #{}] ⚠️ 没有平台能处理该 URL，跳过: {}",
                    index, task.id, task.job_url
                );
                summary.record(task, TaskOutcome::NoRunner);
                continue;
            };
            let platform = runner.platform();

            let health = self.monitor.check_health();
            if !health.should_continue {
                self.halt(&health, &mut summary).await;
                break;
            }
            if health.is_platform_disabled(platform.id()) {
                warn!(
                    "[申请 {} #{}] ⚠️ 平台 {} 已禁用，跳过",
                    index, task.id, platform
                );
                summary.record(task, TaskOutcome::PlatformDisabled);
                continue;
            }

            let ctx = ApplyCtx::new(task, index, platform, &self.settings);
            let result = runner
                .apply(page, &task.resume, &self.answers, &ctx)
                .await;

            let decision = self.monitor.record_attempt(&result, platform.id());
            self.persist(task, platform, &result).await;
            summary.record(task, TaskOutcome::Attempted(result.status));
            self.surface_alert(&decision).await;

            if !decision.should_continue {
                self.halt(&decision, &mut summary).await;
                break;
            }
        }

        summary
    }

    async fn persist(&self, task: &ApplicationTask, platform: Platform, result: &AttemptResult) {
        let record = AttemptRecord {
            application_id: task.id.clone(),
            platform: platform.id().to_string(),
            recorded_at: Utc::now(),
            job_url: task.job_url.clone(),
            result: result.clone(),
        };
        if let Err(e) = self.sink.persist(&record).await {
            error!("[申请 #{}] ❌ 投递记录写入失败: {}", task.id, e);
        }
    }

    /// 把告警交给通知方，连续相同的告警只发一次
    async fn surface_alert(&mut self, decision: &MonitorDecision) {
        let Some(alert) = decision.alert_message.as_deref() else {
            self.last_alert = None;
            return;
        };
        if self.last_alert.as_deref() == Some(alert) {
            return;
        }

        warn!("🔔 {}", alert);
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(alert).await {
                warn!("⚠️ 告警发送失败: {:#}", e);
            }
        }
        self.last_alert = Some(alert.to_string());
    }

    async fn halt(&mut self, decision: &MonitorDecision, summary: &mut RunSummary) {
        let reason = decision
            .pause_reason
            .clone()
            .unwrap_or_else(|| "monitor requested pause".to_string());
        error!("⛔ 引擎暂停: {}", reason);
        self.surface_alert(decision).await;
        summary.halted_reason = Some(reason);
    }
}
