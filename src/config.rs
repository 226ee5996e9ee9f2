//! 程序配置
//!
//! 所有字段都有默认值，环境变量覆盖默认值

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::RateLimitConfig;
use crate::workflow::ApplySettings;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 是否自己启动无头浏览器（否则连接已打开的浏览器）
    pub headless: bool,
    /// 无头模式使用的浏览器可执行文件，为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<PathBuf>,
    /// 答案库文件
    pub answer_bank_path: PathBuf,
    /// 平台配置目录（`<platform>.toml`）
    pub platforms_dir: PathBuf,
    /// 待投递申请的 TOML 目录
    pub queue_folder: PathBuf,
    /// 已处理申请的归档目录
    pub archive_folder: PathBuf,
    /// 截图等审计产物目录
    pub logs_dir: PathBuf,
    /// 运行日志文件
    pub output_log_file: String,
    /// 投递记录（JSONL）
    pub attempt_log_file: PathBuf,
    /// 人工告警文件
    pub alert_file: PathBuf,
    /// 告警 Webhook，为空时不推送
    pub webhook_url: Option<String>,
    /// 单个浏览器操作的超时
    pub step_timeout: Duration,
    /// 点击提交后的等待时间
    pub settle_delay: Duration,
    /// 校验阶段的超时
    pub verify_timeout: Duration,
    pub rate_limits: RateLimitConfig,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 2001,
            headless: false,
            chrome_executable: None,
            answer_bank_path: PathBuf::from("config/answer_bank.toml"),
            platforms_dir: PathBuf::from("config/platforms"),
            queue_folder: PathBuf::from("config/queue"),
            archive_folder: PathBuf::from("output/archive"),
            logs_dir: PathBuf::from("output/screenshots"),
            output_log_file: "output/run.log".to_string(),
            attempt_log_file: PathBuf::from("output/attempts.jsonl"),
            alert_file: PathBuf::from("output/alerts.txt"),
            webhook_url: None,
            step_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(3),
            verify_timeout: Duration::from_secs(15),
            rate_limits: RateLimitConfig::default(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 用任意的变量来源构建（测试时不必修改进程环境）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let path = |name: &str, fallback: PathBuf| lookup(name).map(PathBuf::from).unwrap_or(fallback);

        Ok(Self {
            browser_debug_port: parse_var(&lookup, "BROWSER_DEBUG_PORT", "u16")?
                .unwrap_or(default.browser_debug_port),
            headless: parse_var(&lookup, "HEADLESS", "bool")?.unwrap_or(default.headless),
            chrome_executable: lookup("CHROME_EXECUTABLE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            answer_bank_path: path("ANSWER_BANK_PATH", default.answer_bank_path),
            platforms_dir: path("PLATFORMS_DIR", default.platforms_dir),
            queue_folder: path("QUEUE_FOLDER", default.queue_folder),
            archive_folder: path("ARCHIVE_FOLDER", default.archive_folder),
            logs_dir: path("LOGS_DIR", default.logs_dir),
            output_log_file: lookup("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            attempt_log_file: path("ATTEMPT_LOG_FILE", default.attempt_log_file),
            alert_file: path("ALERT_FILE", default.alert_file),
            webhook_url: lookup("ALERT_WEBHOOK_URL").filter(|v| !v.trim().is_empty()),
            step_timeout: parse_var(&lookup, "STEP_TIMEOUT_SECS", "u64")?
                .map(Duration::from_secs)
                .unwrap_or(default.step_timeout),
            settle_delay: parse_var(&lookup, "SETTLE_DELAY_MS", "u64")?
                .map(Duration::from_millis)
                .unwrap_or(default.settle_delay),
            verify_timeout: parse_var(&lookup, "VERIFY_TIMEOUT_SECS", "u64")?
                .map(Duration::from_secs)
                .unwrap_or(default.verify_timeout),
            rate_limits: RateLimitConfig {
                max_per_hour: parse_var(&lookup, "MAX_PER_HOUR", "u32")?
                    .unwrap_or(default.rate_limits.max_per_hour),
                max_per_day: parse_var(&lookup, "MAX_PER_DAY", "u32")?
                    .unwrap_or(default.rate_limits.max_per_day),
                max_cost_per_day_usd: parse_var(&lookup, "MAX_COST_PER_DAY_USD", "f64")?
                    .unwrap_or(default.rate_limits.max_cost_per_day_usd),
            },
            verbose_logging: parse_var(&lookup, "VERBOSE_LOGGING", "bool")?
                .unwrap_or(default.verbose_logging),
        })
    }

    /// 投递流程共享的设置
    pub fn apply_settings(&self) -> ApplySettings {
        ApplySettings {
            step_timeout: self.step_timeout,
            settle_delay: self.settle_delay,
            logs_dir: Some(self.logs_dir.clone()),
        }
    }
}

/// 变量不存在时为 None，存在但解析失败时报错
fn parse_var<T, F>(lookup: &F, name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.browser_debug_port, 2001);
        assert_eq!(config.rate_limits, RateLimitConfig::default());
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("MAX_PER_HOUR", "4"),
            ("MAX_COST_PER_DAY_USD", "2.5"),
            ("HEADLESS", "true"),
            ("SETTLE_DELAY_MS", "500"),
            ("ALERT_WEBHOOK_URL", "https://hooks.example.com/x"),
        ]))
        .unwrap();

        assert_eq!(config.rate_limits.max_per_hour, 4);
        assert_eq!(config.rate_limits.max_cost_per_day_usd, 2.5);
        assert!(config.headless);
        assert_eq!(config.apply_settings().settle_delay, Duration::from_millis(500));
        assert_eq!(config.webhook_url.as_deref(), Some("https://hooks.example.com/x"));
    }

    #[test]
    fn test_bad_value_is_error() {
        let err = Config::from_lookup(lookup(&[("MAX_PER_DAY", "many")])).unwrap_err();
        assert!(err.to_string().contains("MAX_PER_DAY"));
    }
}
