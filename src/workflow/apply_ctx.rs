//! 投递上下文
//!
//! 封装"我正在处理队列中的第几条申请、投到哪个平台"这一信息

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::ApplicationTask;
use crate::platforms::Platform;

/// 一次运行内所有投递共享的设置
#[derive(Debug, Clone)]
pub struct ApplySettings {
    /// 每个浏览器操作的超时时间
    pub step_timeout: Duration,
    /// 点击提交后等待页面稳定的时间
    pub settle_delay: Duration,
    /// 截图等审计产物的目录
    pub logs_dir: Option<PathBuf>,
}

impl Default for ApplySettings {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(3),
            logs_dir: None,
        }
    }
}

/// 单条申请的处理上下文
#[derive(Debug, Clone)]
pub struct ApplyCtx<'a> {
    pub task: &'a ApplicationTask,
    /// 队列中的序号（从 1 开始，仅用于日志）
    pub index: usize,
    pub platform: Platform,
    pub settings: &'a ApplySettings,
}

impl<'a> ApplyCtx<'a> {
    pub fn new(
        task: &'a ApplicationTask,
        index: usize,
        platform: Platform,
        settings: &'a ApplySettings,
    ) -> Self {
        Self {
            task,
            index,
            platform,
            settings,
        }
    }

    pub fn application_id(&self) -> &str {
        &self.task.id
    }

    pub fn market(&self) -> &str {
        &self.task.market
    }
}

impl Display for ApplyCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[申请 {} #{} 平台 {}]",
            self.index, self.task.id, self.platform
        )
    }
}
