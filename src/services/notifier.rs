//! 告警通知 - 业务能力层
//!
//! 只负责把监控器的 `alert_message` 送达人工，不关心何时告警

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;
use serde_json::json;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// 通知协作方
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, alert: &str) -> Result<()>;
}

/// 追加写入告警文件
pub struct AlertWriter {
    alert_file_path: PathBuf,
}

impl AlertWriter {
    pub fn new() -> Self {
        Self {
            alert_file_path: PathBuf::from("alerts.txt"),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            alert_file_path: path.into(),
        }
    }
}

impl Default for AlertWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for AlertWriter {
    async fn notify(&self, alert: &str) -> Result<()> {
        debug!("写入告警: {}", alert);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.alert_file_path)
            .with_context(|| format!("无法打开告警文件 {}", self.alert_file_path.display()))?;

        let line = format!(
            "[{}] {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            alert
        );
        file.write_all(line.as_bytes())?;

        Ok(())
    }
}

/// 以 JSON POST 推送到 Webhook（Slack / 飞书等兼容 `text` 字段的接收端）
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, alert: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": alert }))
            .send()
            .await
            .context("Webhook 请求失败")?;

        response
            .error_for_status()
            .context("Webhook 返回错误状态")?;
        Ok(())
    }
}
