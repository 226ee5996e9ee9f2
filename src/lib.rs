//! # ATS Auto Apply
//!
//! 在 Workday / Greenhouse / Lever 上自动填写并提交职位申请
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，实现 `FormPage`
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `AnswerBank` - 个人信息、筛选问题答案、简历格式
//! - `ApplyVerifier` - 提交后判断是否真的投递成功
//! - `ApplyMonitor` - 熔断器、频率限制、每日花费上限
//! - `AlertWriter` / `WebhookNotifier` - 告警送达人工
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条申请"的完整投递流程
//! - `platforms/` - 每个 ATS 平台的选择器配置和专属步骤
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/engine` - 逐条投递，听从监控器
//! - `orchestrator/app` - 管理浏览器和队列文件
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod platforms;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
pub mod test_support;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{FormPage, JsExecutor};
pub use models::{ApplicationTask, AttemptResult, AttemptStatus, MonitorDecision};
pub use orchestrator::{App, AutoApplyEngine, RunSummary};
pub use platforms::{Platform, PlatformRunner, RunnerSet};
pub use services::{AnswerBank, ApplyMonitor, ApplyVerifier};
