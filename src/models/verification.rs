use serde::{Deserialize, Serialize};
use std::fmt;

/// 提交成功的置信度分级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// 命中了平台声明的确认信号
    Hard,
    /// 表单已消失，但没有确认信号
    Soft,
    /// 没有任何成功迹象
    #[serde(rename = "none")]
    Unconfirmed,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Hard => "hard",
            Confidence::Soft => "soft",
            Confidence::Unconfirmed => "none",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 校验器对提交后页面状态的判断
///
/// 只能通过下面的构造函数创建，保证 `is_verified` 与 `confidence == Hard` 一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_verified: bool,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_matched: Option<String>,
    pub form_still_visible: bool,
    #[serde(default)]
    pub error_banners: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
    pub reason: String,
}

impl VerificationResult {
    pub fn hard(signal: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            is_verified: true,
            confidence: Confidence::Hard,
            signal_matched: Some(signal.into()),
            form_still_visible: false,
            error_banners: Vec::new(),
            screenshot_path: None,
            reason: reason.into(),
        }
    }

    pub fn soft(reason: impl Into<String>) -> Self {
        Self {
            is_verified: false,
            confidence: Confidence::Soft,
            signal_matched: None,
            form_still_visible: false,
            error_banners: Vec::new(),
            screenshot_path: None,
            reason: reason.into(),
        }
    }

    pub fn unconfirmed(
        form_still_visible: bool,
        error_banners: Vec<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            is_verified: false,
            confidence: Confidence::Unconfirmed,
            signal_matched: None,
            form_still_visible,
            error_banners,
            screenshot_path: None,
            reason: reason.into(),
        }
    }

    pub fn has_error_banners(&self) -> bool {
        !self.error_banners.is_empty()
    }
}
