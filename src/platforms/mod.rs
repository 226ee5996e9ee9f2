//! 平台层
//!
//! 平台集合是封闭的：新增一个 ATS 厂商 = 新增一个 `Platform` 变体 +
//! 一个 runner 变体 + 一个声明式配置文件，不存在隐藏的扩展钩子
//!
//! ```text
//! RunnerSet (detect)
//!     ↓
//! PlatformRunner::{Workday, Greenhouse, Lever}
//!     ↓
//! workflow::apply_flow (通用流程 + 平台步骤)
//! ```

pub mod config;
pub mod greenhouse;
pub mod lever;
pub mod registry;
pub mod runner;
pub mod workday;

use std::fmt;

use crate::error::PlatformConfigError;
use config::fields;

pub use config::{ConfirmationSignals, PageStateSelectors, PlatformConfig};
pub use registry::RunnerSet;
pub use runner::PlatformRunner;

/// 支持的 ATS 平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Workday,
    Greenhouse,
    Lever,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Workday, Platform::Greenhouse, Platform::Lever];

    /// 平台标识，同时也是配置文件名和监控器里的平台 key
    pub fn id(self) -> &'static str {
        match self {
            Platform::Workday => "workday",
            Platform::Greenhouse => "greenhouse",
            Platform::Lever => "lever",
        }
    }

    pub fn from_id(id: &str) -> Result<Self, PlatformConfigError> {
        Self::ALL
            .into_iter()
            .find(|p| p.id().eq_ignore_ascii_case(id.trim()))
            .ok_or_else(|| PlatformConfigError::UnknownPlatform(id.to_string()))
    }

    /// 平台内置的必填字段，配置文件必须为它们提供候选选择器
    pub fn mandatory_fields(self) -> &'static [&'static str] {
        match self {
            Platform::Workday => &[
                fields::FIRST_NAME,
                fields::LAST_NAME,
                fields::EMAIL,
                fields::PHONE,
                fields::RESUME_UPLOAD,
                fields::SUBMIT,
            ],
            Platform::Greenhouse => &[
                fields::FIRST_NAME,
                fields::LAST_NAME,
                fields::EMAIL,
                fields::RESUME_UPLOAD,
                fields::SUBMIT,
            ],
            Platform::Lever => &[
                fields::FULL_NAME,
                fields::EMAIL,
                fields::RESUME_UPLOAD,
                fields::SUBMIT,
            ],
        }
    }

    pub fn config_file_name(self) -> String {
        format!("{}.toml", self.id())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
