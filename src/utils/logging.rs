use anyhow::{Context, Result};
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::orchestrator::RunSummary;

/// 初始化 tracing，`RUST_LOG` 优先
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("无法创建日志目录 {}", parent.display()))?;
    }

    let log_header = format!(
        "{}\n自动投递日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件 {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动投递模式（串行）");
    info!(
        "📊 限额: 每小时 {} 次 / 每天 {} 次 / 每天 ${:.2}",
        config.rate_limits.max_per_hour,
        config.rate_limits.max_per_day,
        config.rate_limits.max_cost_per_day_usd
    );
    info!(
        "⏱️ 单步超时 {}s，提交后等待 {}ms",
        config.step_timeout.as_secs(),
        config.settle_delay.as_millis()
    );
    info!("{}", "=".repeat(60));
}

/// 记录队列加载信息
///
/// # 参数
/// - `total`: 申请总数
/// - `platforms`: 已加载的平台
pub fn log_queue_loaded(total: usize, platforms: &[String]) {
    info!("✓ 找到 {} 条待投递的申请", total);
    info!("📋 已启用平台: {}", platforms.join(", "));
    info!("💡 逐条投递，监控器要求暂停时立即停止\n");
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 本次运行统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已确认: {}/{}", summary.applied_verified, summary.total);
    info!("🟡 待抽查: {}", summary.applied_soft);
    info!("❌ 失败: {}", summary.failed);
    info!("⏸️ 需人工: {}", summary.paused);
    info!(
        "⏭️ 跳过: {} (无匹配平台) / {} (平台已禁用)",
        summary.skipped_no_runner, summary.skipped_disabled
    );
    if let Some(reason) = &summary.halted_reason {
        info!("⛔ 引擎已暂停: {} (剩余 {} 条)", reason, summary.not_started());
    }
    if summary.cancelled {
        info!("🛑 运行被手动停止 (剩余 {} 条)", summary.not_started());
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
