//! 投递中止原因
//!
//! 流程中的每个步骤返回 `Result<_, Halt>`，用 `?` 提前结束；
//! 中止原因最终映射为一个带类型的 `AttemptStatus`，不会向上抛出

use std::fmt;

use crate::models::AttemptStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// 浏览器操作超时
    Timeout(String),
    /// 必填字段的所有候选选择器都未命中
    SelectorNotFound(String),
    /// 页面出现验证码 / 机器人检测
    Captcha,
    /// 职位已关闭
    JobClosed(String),
    /// 必填的筛选问题需要人工回答
    NeedsReview(Vec<String>),
    /// 投递所需的数据缺失（未知市场、没有简历文件）
    MissingData(String),
    /// 浏览器驱动返回错误
    Driver { step: String, message: String },
}

impl Halt {
    pub fn status(&self) -> AttemptStatus {
        match self {
            // 驱动错误可以重试，但同样推动熔断器
            Halt::Timeout(_) | Halt::Driver { .. } => AttemptStatus::PausedTimeout,
            Halt::SelectorNotFound(_) => AttemptStatus::PausedSelectorFailed,
            Halt::Captcha | Halt::NeedsReview(_) => AttemptStatus::PausedCaptcha,
            Halt::JobClosed(_) | Halt::MissingData(_) => AttemptStatus::FailedPermanent,
        }
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Timeout(step) => write!(f, "timeout during step '{}'", step),
            Halt::SelectorNotFound(field) => {
                write!(f, "no candidate selector resolved for required field '{}'", field)
            }
            Halt::Captcha => write!(f, "bot challenge detected; human required"),
            Halt::JobClosed(text) => write!(f, "job posting closed: {}", text),
            Halt::NeedsReview(questions) => write!(
                f,
                "screening question(s) need human review: {}",
                questions.join(" | ")
            ),
            Halt::MissingData(what) => write!(f, "missing application data: {}", what),
            Halt::Driver { step, message } => {
                write!(f, "browser error during step '{}': {}", step, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halt_status_mapping() {
        assert_eq!(
            Halt::Timeout("goto".into()).status(),
            AttemptStatus::PausedTimeout
        );
        assert_eq!(
            Halt::SelectorNotFound("email".into()).status(),
            AttemptStatus::PausedSelectorFailed
        );
        assert_eq!(Halt::Captcha.status(), AttemptStatus::PausedCaptcha);
        assert_eq!(
            Halt::NeedsReview(vec!["Salary?".into()]).status(),
            AttemptStatus::PausedCaptcha
        );
        assert_eq!(
            Halt::JobClosed("no longer accepting".into()).status(),
            AttemptStatus::FailedPermanent
        );
    }

    #[test]
    fn test_driver_error_is_retryable() {
        let halt = Halt::Driver {
            step: "click submit".into(),
            message: "element is not clickable".into(),
        };
        assert_eq!(halt.status(), AttemptStatus::PausedTimeout);
        assert!(halt.status().is_failure_like());
    }

    #[test]
    fn test_halt_describes_field() {
        let text = Halt::SelectorNotFound("email".into()).to_string();
        assert!(text.contains("email"));
    }
}
