use thiserror::Error;

use crate::models::PersonalInfoError;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 筛选问题答案库错误
    #[error("答案库错误: {0}")]
    AnswerBank(#[from] AnswerBankError),
    /// 平台配置错误
    #[error("平台配置错误: {0}")]
    Platform(#[from] PlatformConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("浏览器配置失败: {0}")]
    ConfigurationFailed(String),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 答案库加载与查询错误
#[derive(Debug, Error)]
pub enum AnswerBankError {
    #[error("答案库缺少必需的市场: {}", .0.join(", "))]
    MissingMarkets(Vec<String>),
    #[error("未找到市场: '{0}'")]
    MarketNotFound(String),
    #[error("市场重复定义（忽略大小写）: '{0}'")]
    DuplicateMarket(String),
    #[error("市场 {market} 的个人信息不合法: {source}")]
    InvalidPersonalInfo {
        market: String,
        #[source]
        source: PersonalInfoError,
    },
    #[error("筛选问题规则 #{index} ('{pattern}') 不合法: {reason}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        reason: String,
    },
    #[error("resume_formats 缺少 default 项")]
    MissingDefaultFormat,
}

/// 平台配置加载错误
#[derive(Debug, Error)]
pub enum PlatformConfigError {
    #[error("未知平台: '{0}'")]
    UnknownPlatform(String),
    #[error("平台 {expected} 的配置文件声明的是 '{found}'")]
    PlatformMismatch { expected: String, found: String },
    #[error("平台 {platform} 未声明任何 url_patterns")]
    NoUrlPatterns { platform: String },
    #[error("平台 {platform} 缺少必填字段 '{field}' 的选择器列表")]
    MissingSelectors { platform: String, field: String },
    #[error("平台 {platform} 未声明任何确认信号")]
    NoConfirmationSignals { platform: String },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
