//! 页面能力抽象
//!
//! Runner 和校验器只认识 `FormPage`，不直接接触 chromiumoxide，
//! 这样两者都可以在没有浏览器的情况下测试

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 页面上的一个筛选问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBlock {
    /// 问题文本（label 或整个问题块的文本）
    pub label: String,
    /// 可直接用于填写的输入框选择器
    pub input_selector: String,
    #[serde(default)]
    pub required: bool,
}

/// 表单页面的操作能力
///
/// 所有选择器均为 CSS 选择器
#[async_trait]
pub trait FormPage: Send + Sync {
    /// 当前页面 URL
    async fn current_url(&self) -> Result<String>;

    /// 导航到指定 URL
    async fn goto(&self, url: &str) -> Result<()>;

    /// 页面 body 的可见文本
    async fn body_text(&self) -> Result<String>;

    /// 选择器是否能在当前 DOM 中找到元素
    async fn exists(&self, selector: &str) -> Result<bool>;

    /// 元素是否存在且可见
    async fn is_visible(&self, selector: &str) -> Result<bool>;

    /// 所有匹配元素的非空文本
    async fn texts(&self, selector: &str) -> Result<Vec<String>>;

    /// 填写输入框 / 文本域 / 下拉框
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// 确保复选框处于勾选状态
    async fn check(&self, selector: &str) -> Result<()>;

    /// 逐字输入后按下确认键（标签式输入框）
    async fn type_and_press(&self, selector: &str, text: &str, key: &str) -> Result<()>;

    /// 给文件输入框设置上传文件
    async fn upload_file(&self, selector: &str, path: &Path) -> Result<()>;

    /// 截图保存到指定路径
    async fn screenshot(&self, path: &Path) -> Result<()>;

    /// 列出容器选择器匹配到的所有问题块
    async fn question_blocks(&self, container_selector: &str) -> Result<Vec<QuestionBlock>>;
}
