//! 投递记录持久化 - 业务能力层
//!
//! 只负责"把一次投递结果落盘"能力，一行一条 JSON

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AppResult, FileError};
use crate::models::AttemptResult;

/// 一条投递记录，以申请 ID + 平台 + 时间为键
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub application_id: String,
    pub platform: String,
    pub recorded_at: DateTime<Utc>,
    pub job_url: String,
    pub result: AttemptResult,
}

/// 持久化协作方
#[async_trait]
pub trait AttemptSink: Send + Sync {
    async fn persist(&self, record: &AttemptRecord) -> AppResult<()>;
}

/// 追加写入 JSONL 文件
pub struct JsonlAttemptLog {
    path: PathBuf,
}

impl JsonlAttemptLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_failed(&self, source: std::io::Error) -> FileError {
        FileError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl AttemptSink for JsonlAttemptLog {
    async fn persist(&self, record: &AttemptRecord) -> AppResult<()> {
        debug!(
            "写入投递记录: {} | {} | {}",
            record.application_id, record.platform, record.result.status
        );

        let mut line = serde_json::to_string(record)
            .map_err(|e| self.write_failed(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_failed(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_failed(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.write_failed(e))?;

        Ok(())
    }
}
