//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、答案库、平台配置、浏览器、JsExecutor
//! 2. **队列加载**：扫描待投递的申请（`Vec<ApplicationTask>`）
//! 3. **委托引擎**：逐条投递交给 `AutoApplyEngine`
//! 4. **收尾**：归档已完成的申请文件，输出全局统计
//!
//! 唯一持有 Browser 的模块

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::JsExecutor;
use crate::models::{self, ApplicationTask, AttemptStatus};
use crate::orchestrator::engine::{AutoApplyEngine, RunSummary, TaskOutcome};
use crate::platforms::RunnerSet;
use crate::services::{AlertWriter, AnswerBank, ApplyMonitor, JsonlAttemptLog, WebhookNotifier};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    executor: JsExecutor,
    engine: AutoApplyEngine,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        let answers = AnswerBank::load(&config.answer_bank_path)
            .with_context(|| format!("无法加载答案库 {}", config.answer_bank_path.display()))?;
        info!("✓ 答案库已加载 (版本 {})", answers.version());

        let runners = RunnerSet::load(&config.platforms_dir, config.verify_timeout)
            .with_context(|| format!("无法加载平台配置 {}", config.platforms_dir.display()))?;
        if runners.is_empty() {
            anyhow::bail!("没有可用的平台配置: {}", config.platforms_dir.display());
        }

        let (browser, page) = if config.headless {
            browser::launch_headless_browser(config.chrome_executable.as_deref()).await?
        } else {
            browser::connect_to_browser_and_page(config.browser_debug_port).await?
        };

        // 创建 JsExecutor（持有 page）
        let executor = JsExecutor::new(page);

        let mut engine = AutoApplyEngine::new(
            runners,
            answers,
            ApplyMonitor::new(config.rate_limits),
            config.apply_settings(),
            Box::new(JsonlAttemptLog::new(&config.attempt_log_file)),
        )
        .with_notifier(Box::new(AlertWriter::with_path(&config.alert_file)));
        if let Some(url) = &config.webhook_url {
            info!("📤 告警将同时推送到 Webhook");
            engine = engine.with_notifier(Box::new(WebhookNotifier::new(
                url.clone(),
                config.step_timeout,
            )));
        }

        Ok(Self {
            config,
            _browser: browser,
            executor,
            engine,
        })
    }

    /// Ctrl+C 处理持有的停止令牌
    pub fn cancellation_token(&self) -> CancellationToken {
        self.engine.cancellation_token()
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<RunSummary> {
        info!("\n📁 正在扫描待投递的申请...");
        let tasks = models::load_application_queue(&self.config.queue_folder).await?;

        if tasks.is_empty() {
            warn!("⚠️ 没有找到待投递的TOML文件，程序结束");
            return Ok(RunSummary::default());
        }

        let platforms: Vec<String> = self
            .engine
            .platforms()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        logging::log_queue_loaded(tasks.len(), &platforms);

        let summary = self.engine.run(&self.executor, &tasks).await;

        self.archive_finished(&tasks, &summary).await;
        logging::print_final_stats(&summary, &self.config.output_log_file);

        Ok(summary)
    }

    /// 归档已有最终结论的申请，需要人工处理的留在队列中
    async fn archive_finished(&self, tasks: &[ApplicationTask], summary: &RunSummary) {
        for task in tasks {
            if !should_archive(summary.outcome_of(&task.id)) {
                continue;
            }
            if let Err(e) = models::archive_task_file(task, &self.config.archive_folder).await {
                error!("[申请 {}] ❌ 归档失败: {:#}", task.id, e);
            }
        }
    }
}

/// 只有成功或永久失败的申请离开队列；暂停类结果（含超时、驱动错误）留待重试
fn should_archive(outcome: Option<TaskOutcome>) -> bool {
    matches!(
        outcome,
        Some(TaskOutcome::Attempted(
            AttemptStatus::AppliedVerified
                | AttemptStatus::AppliedSoft
                | AttemptStatus::FailedPermanent
        ))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VerificationResult;
    use crate::workflow::{status_for, Halt};

    fn attempted(status: AttemptStatus) -> Option<TaskOutcome> {
        Some(TaskOutcome::Attempted(status))
    }

    #[test]
    fn test_driver_error_stays_in_queue() {
        let halt = Halt::Driver {
            step: "click submit".to_string(),
            message: "Node is detached from document".to_string(),
        };
        assert!(!should_archive(attempted(halt.status())));
        assert!(!should_archive(attempted(
            Halt::Timeout("upload resume_upload".to_string()).status()
        )));
    }

    #[test]
    fn test_unconfirmed_submit_stays_in_queue() {
        let stall = VerificationResult::unconfirmed(true, Vec::new(), "form still visible");
        assert!(!should_archive(attempted(status_for(&stall))));

        let banner = VerificationResult::unconfirmed(true, vec!["Email is invalid".into()], "");
        assert!(should_archive(attempted(status_for(&banner))));
    }

    #[test]
    fn test_final_outcomes_are_archived() {
        assert!(should_archive(attempted(AttemptStatus::AppliedVerified)));
        assert!(should_archive(attempted(AttemptStatus::AppliedSoft)));
        assert!(should_archive(attempted(AttemptStatus::FailedPermanent)));
        assert!(!should_archive(Some(TaskOutcome::NoRunner)));
        assert!(!should_archive(Some(TaskOutcome::PlatformDisabled)));
        assert!(!should_archive(None));
    }
}
