//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、归档）
//! - 加载申请队列（Vec<ApplicationTask>）
//! - 持有 Browser 和 JsExecutor
//! - 输出全局统计信息
//!
//! ### `engine` - 自动投递引擎
//! - 按顺序遍历队列，一次一个页面
//! - 选择 PlatformRunner，询问 ApplyMonitor
//! - 持久化每次投递结果，转发告警
//! - 监控器要求暂停时停止
//!
//! ## 层次关系
//!
//! ```text
//! app (处理 Vec<ApplicationTask>)
//!     ↓
//! engine (逐条投递 + 监控)
//!     ↓
//! platforms::PlatformRunner → workflow::run_apply (处理单个申请)
//!     ↓
//! services (能力层：answer_bank / verifier / monitor / notifier)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```

pub mod app;
pub mod engine;

// 重新导出主要类型
pub use app::App;
pub use engine::{AutoApplyEngine, RunSummary, TaskOutcome};
