//! 投递结果模型
//!
//! `AttemptResult` 是核心交给外部协作者（持久化、通知）的唯一契约

use serde::{Deserialize, Serialize};
use std::fmt;

/// 单次投递的结果类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// 已提交，且命中了硬确认信号
    AppliedVerified,
    /// 表单已消失但没有硬确认信号，建议人工抽查
    AppliedSoft,
    /// 永久失败（职位关闭、表单报错等）
    FailedPermanent,
    /// 需要人工介入（验证码、需人工回答的筛选问题）
    PausedCaptcha,
    /// 浏览器等待超时
    PausedTimeout,
    /// 必填字段的所有候选选择器都未命中
    PausedSelectorFailed,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::AppliedVerified => "applied_verified",
            AttemptStatus::AppliedSoft => "applied_soft",
            AttemptStatus::FailedPermanent => "failed_permanent",
            AttemptStatus::PausedCaptcha => "paused_captcha",
            AttemptStatus::PausedTimeout => "paused_timeout",
            AttemptStatus::PausedSelectorFailed => "paused_selector_failed",
        }
    }

    /// 是否算作成功（会清零连续失败计数）
    pub fn is_success_like(self) -> bool {
        matches!(
            self,
            AttemptStatus::AppliedVerified | AttemptStatus::AppliedSoft
        )
    }

    /// 是否算作失败（会推动熔断器）
    ///
    /// `PausedCaptcha` 既不是成功也不是失败
    pub fn is_failure_like(self) -> bool {
        matches!(
            self,
            AttemptStatus::FailedPermanent
                | AttemptStatus::PausedTimeout
                | AttemptStatus::PausedSelectorFailed
        )
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单次投递的完整结果
///
/// 由 Runner 在 `apply()` 结束时通过 [`AttemptResultBuilder`] 构建，之后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub status: AttemptStatus,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub steps_taken: Vec<String>,
    pub duration_seconds: f64,
    #[serde(default)]
    pub fields_filled: Vec<String>,
    pub cost_usd: f64,
}

impl AttemptResult {
    pub fn builder() -> AttemptResultBuilder {
        AttemptResultBuilder::default()
    }

    /// 仅有状态和费用的结果，主要用于测试与运维工具
    pub fn with_status(status: AttemptStatus, cost_usd: f64) -> Self {
        Self::builder().cost_usd(cost_usd).finish(status, 0.0)
    }
}

/// 投递过程中逐步积累的结果
///
/// Runner 在每个步骤里往里追加信息，最后调用 `finish` 得到不可变的 `AttemptResult`
#[derive(Debug, Default, Clone)]
pub struct AttemptResultBuilder {
    screenshots: Vec<String>,
    confirmation_text: Option<String>,
    confirmation_url: Option<String>,
    errors: Vec<String>,
    steps_taken: Vec<String>,
    fields_filled: Vec<String>,
    cost_usd: f64,
}

impl AttemptResultBuilder {
    pub fn step(&mut self, step: impl Into<String>) -> &mut Self {
        self.steps_taken.push(step.into());
        self
    }

    pub fn field_filled(&mut self, field: impl Into<String>) -> &mut Self {
        self.fields_filled.push(field.into());
        self
    }

    pub fn error(&mut self, error: impl Into<String>) -> &mut Self {
        self.errors.push(error.into());
        self
    }

    pub fn screenshot(&mut self, path: impl Into<String>) -> &mut Self {
        self.screenshots.push(path.into());
        self
    }

    pub fn confirmation(&mut self, text: Option<String>, url: Option<String>) -> &mut Self {
        self.confirmation_text = text;
        self.confirmation_url = url;
        self
    }

    pub fn cost_usd(mut self, cost_usd: f64) -> Self {
        self.cost_usd = cost_usd;
        self
    }

    pub fn steps(&self) -> &[String] {
        &self.steps_taken
    }

    pub fn finish(self, status: AttemptStatus, duration_seconds: f64) -> AttemptResult {
        AttemptResult {
            status,
            screenshots: self.screenshots,
            confirmation_text: self.confirmation_text,
            confirmation_url: self.confirmation_url,
            errors: self.errors,
            steps_taken: self.steps_taken,
            duration_seconds,
            fields_filled: self.fields_filled,
            cost_usd: self.cost_usd,
        }
    }
}
