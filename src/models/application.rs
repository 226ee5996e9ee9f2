use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 简历文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeFormat {
    Pdf,
    Docx,
}

impl ResumeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "pdf",
            ResumeFormat::Docx => "docx",
        }
    }
}

/// 外部生成好的简历内容
///
/// 简历文本的生成与渲染不在本系统范围内，这里只接收产物
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docx_path: Option<PathBuf>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    /// 生成这份简历花费的费用（计入每日费用上限）
    #[serde(default)]
    pub cost_usd: f64,
}

impl ResumeContent {
    /// 按格式选择简历文件，首选格式不存在时退回另一种
    pub fn file_for(&self, format: ResumeFormat) -> Option<&Path> {
        let (preferred, fallback) = match format {
            ResumeFormat::Pdf => (&self.pdf_path, &self.docx_path),
            ResumeFormat::Docx => (&self.docx_path, &self.pdf_path),
        };
        preferred.as_deref().or(fallback.as_deref())
    }
}

/// 队列中的一条待投递申请
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationTask {
    pub id: String,
    pub job_url: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    pub market: String,
    #[serde(default)]
    pub resume: ResumeContent,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}
