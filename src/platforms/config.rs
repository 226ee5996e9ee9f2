//! 平台声明式配置
//!
//! 每个 ATS 平台一个 TOML 文件：URL 匹配规则、字段选择器表、确认信号

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{AppResult, FileError, PlatformConfigError};

use super::Platform;

/// 表单字段名
pub mod fields {
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const FULL_NAME: &str = "full_name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const CITY: &str = "city";
    pub const STATE: &str = "state";
    pub const ZIP: &str = "zip";
    pub const COUNTRY: &str = "country";
    pub const LOCATION: &str = "location";
    pub const LINKEDIN: &str = "linkedin";
    pub const COVER_LETTER: &str = "cover_letter";
    pub const RESUME_UPLOAD: &str = "resume_upload";
    pub const SUBMIT: &str = "submit";
    pub const QUESTION_BLOCK: &str = "question_block";

    // 平台特有的步骤
    pub const APPLY_BUTTON: &str = "apply_button";
    pub const APPLY_MANUALLY: &str = "apply_manually";
    pub const NEXT_BUTTON: &str = "next_button";
    pub const SMS_CONSENT: &str = "sms_consent";
    pub const SKILLS_INPUT: &str = "skills_input";
    pub const BACKGROUND_CHECK: &str = "background_check";
    pub const DATA_CONSENT: &str = "data_consent";

    /// 直接用个人信息填写的文本字段，按填写顺序排列
    pub const PERSONAL_FIELDS: &[&str] = &[
        FIRST_NAME, LAST_NAME, FULL_NAME, EMAIL, PHONE, CITY, STATE, ZIP, COUNTRY, LOCATION,
    ];
}

/// 提交成功的确认信号，任意一条命中即为硬确认
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmationSignals {
    #[serde(default)]
    pub url_patterns: Vec<String>,
    #[serde(default)]
    pub dom_text: Vec<String>,
    #[serde(default)]
    pub dom_selectors: Vec<String>,
}

impl ConfirmationSignals {
    pub fn is_empty(&self) -> bool {
        self.url_patterns.is_empty() && self.dom_text.is_empty() && self.dom_selectors.is_empty()
    }
}

/// 用于判断页面状态的选择器
#[derive(Debug, Clone, Deserialize)]
pub struct PageStateSelectors {
    /// 申请表单本身
    #[serde(default = "default_form_selectors")]
    pub form: Vec<String>,
    #[serde(default)]
    pub error_banners: Vec<String>,
    #[serde(default)]
    pub captcha: Vec<String>,
    /// 职位已关闭的提示文字
    #[serde(default)]
    pub closed_text: Vec<String>,
}

fn default_form_selectors() -> Vec<String> {
    vec!["form".to_string()]
}

impl Default for PageStateSelectors {
    fn default() -> Self {
        Self {
            form: default_form_selectors(),
            error_banners: Vec::new(),
            captcha: Vec::new(),
            closed_text: Vec::new(),
        }
    }
}

/// 单个平台的完整配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    pub version: String,
    pub platform: String,
    pub url_patterns: Vec<String>,
    /// 除平台内置必填字段外，额外声明为必填的字段
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// 字段名 → 有序的候选选择器列表，第一个命中的生效
    #[serde(default)]
    pub selectors: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub confirmation_signals: ConfirmationSignals,
    #[serde(default)]
    pub page_state: PageStateSelectors,
}

impl PlatformConfig {
    /// 从文件加载并校验
    pub fn load(path: &Path, expected: Platform) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: PlatformConfig =
            toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?;
        config.validate(expected)?;
        Ok(config)
    }

    /// 加载期校验：必填字段必须有非空的候选列表
    pub fn validate(&self, expected: Platform) -> Result<(), PlatformConfigError> {
        if !self.platform.eq_ignore_ascii_case(expected.id()) {
            return Err(PlatformConfigError::PlatformMismatch {
                expected: expected.id().to_string(),
                found: self.platform.clone(),
            });
        }

        if self.url_patterns.iter().all(|p| p.trim().is_empty()) {
            return Err(PlatformConfigError::NoUrlPatterns {
                platform: self.platform.clone(),
            });
        }

        for field in self.required_field_names(expected) {
            let has_candidates = self
                .selectors
                .get(field)
                .map(|candidates| candidates.iter().any(|c| !c.trim().is_empty()))
                .unwrap_or(false);
            if !has_candidates {
                return Err(PlatformConfigError::MissingSelectors {
                    platform: self.platform.clone(),
                    field: field.to_string(),
                });
            }
        }

        if self.confirmation_signals.is_empty() {
            return Err(PlatformConfigError::NoConfirmationSignals {
                platform: self.platform.clone(),
            });
        }

        Ok(())
    }

    /// 平台内置必填字段 + 文件声明的必填字段
    pub fn required_field_names(&self, platform: Platform) -> Vec<&str> {
        let mut names: Vec<&str> = platform.mandatory_fields().to_vec();
        for field in &self.required_fields {
            if !names.contains(&field.as_str()) {
                names.push(field.as_str());
            }
        }
        names
    }

    pub fn is_required(&self, platform: Platform, field: &str) -> bool {
        self.required_field_names(platform).contains(&field)
    }

    /// 字段的候选选择器，未配置时为空切片
    pub fn candidates(&self, field: &str) -> &[String] {
        self.selectors
            .get(field)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// URL 是否属于本平台
    ///
    /// 规则按形态区分，均不区分大小写，查询参数和锚点不参与：
    /// - `greenhouse.io`：host 完全相同，或以 `.greenhouse.io` 结尾
    /// - `/embed/job_app`：只在 path 中查找
    /// - `greenhouse.io/embed`：host 规则和 path 前缀同时满足
    pub fn matches_url(&self, url: &str) -> bool {
        let Some((host, path)) = split_http_url(url) else {
            return false;
        };

        self.url_patterns
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .any(|pattern| {
                if pattern.starts_with('/') {
                    return path.contains(&pattern);
                }
                match pattern.split_once('/') {
                    Some((domain, prefix)) => {
                        host_matches(&host, domain) && path.starts_with(&format!("/{}", prefix))
                    }
                    None => host_matches(&host, &pattern),
                }
            })
    }
}

/// 拆出小写的 host 和 path，去掉账号信息和端口；非 http(s) 地址返回 None
fn split_http_url(url: &str) -> Option<(String, String)> {
    let url = url.trim().to_lowercase();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let rest = rest.split(['?', '#']).next().unwrap_or_default();

    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, "/"),
    };
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    if host.is_empty() {
        return None;
    }
    Some((host.to_string(), path.to_string()))
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}
