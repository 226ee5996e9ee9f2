//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，对上层只暴露 [`FormPage`] 能力

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

use super::page::{FormPage, QuestionBlock};

const SELECTOR_PLACEHOLDER: &str = "__SELECTOR__";
const VALUE_PLACEHOLDER: &str = "__VALUE__";

const JS_EXISTS: &str = "document.querySelector(__SELECTOR__) !== null";

const JS_IS_VISIBLE: &str = r#"
(() => {
    const el = document.querySelector(__SELECTOR__);
    if (!el) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
})()
"#;

const JS_TEXTS: &str = r#"
Array.from(document.querySelectorAll(__SELECTOR__))
    .map(el => (el.innerText || el.textContent || '').trim())
    .filter(text => text.length > 0)
"#;

// 使用原生 setter，保证 React 等框架能收到 input/change 事件
const JS_FILL: &str = r#"
(() => {
    const el = document.querySelector(__SELECTOR__);
    if (!el) return false;
    el.focus();
    const proto = el.tagName === 'TEXTAREA'
        ? HTMLTextAreaElement.prototype
        : el.tagName === 'SELECT' ? HTMLSelectElement.prototype : HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
    setter.call(el, __VALUE__);
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    el.blur();
    return true;
})()
"#;

const JS_CHECK: &str = r#"
(() => {
    const el = document.querySelector(__SELECTOR__);
    if (!el) return false;
    if (!el.checked) el.click();
    return true;
})()
"#;

const JS_QUESTION_BLOCKS: &str = r#"
Array.from(document.querySelectorAll(__SELECTOR__)).map((block, i) => {
    const input = block.querySelector('input:not([type=hidden]), textarea, select');
    if (!input) return null;
    input.setAttribute('data-autoapply-q', String(i));
    const labelEl = block.querySelector('label, legend');
    const label = ((labelEl ? labelEl.innerText : block.innerText) || '').trim();
    return {
        label: label,
        input_selector: '[data-autoapply-q="' + i + '"]',
        required: input.required || label.includes('*')
    };
}).filter(Boolean)
"#;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力和 FormPage 能力
/// - 不认识具体的 ATS 平台
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 执行一个以选择器为参数的脚本
    async fn eval_with_selector<T: DeserializeOwned>(
        &self,
        template: &str,
        selector: &str,
    ) -> Result<T> {
        let js_code = template.replace(SELECTOR_PLACEHOLDER, &serde_json::to_string(selector)?);
        self.eval_as(js_code).await
    }
}

#[async_trait]
impl FormPage for JsExecutor {
    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .with_context(|| format!("导航到 {} 失败", url))?;
        Ok(())
    }

    async fn body_text(&self) -> Result<String> {
        self.eval_as("document.body ? document.body.innerText : ''")
            .await
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        self.eval_with_selector(JS_EXISTS, selector).await
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        self.eval_with_selector(JS_IS_VISIBLE, selector).await
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        self.eval_with_selector(JS_TEXTS, selector).await
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let js_code = JS_FILL
            .replace(SELECTOR_PLACEHOLDER, &serde_json::to_string(selector)?)
            .replace(VALUE_PLACEHOLDER, &serde_json::to_string(value)?);

        let filled: bool = self.eval_as(js_code).await?;
        if !filled {
            anyhow::bail!("填写失败，元素不存在: {}", selector);
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到可点击的元素: {}", selector))?
            .click()
            .await?;
        Ok(())
    }

    async fn check(&self, selector: &str) -> Result<()> {
        let checked: bool = self.eval_with_selector(JS_CHECK, selector).await?;
        if !checked {
            anyhow::bail!("勾选失败，元素不存在: {}", selector);
        }
        Ok(())
    }

    async fn type_and_press(&self, selector: &str, text: &str, key: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到输入框: {}", selector))?;
        element.click().await?;
        element.type_str(text).await?;
        element.press_key(key).await?;
        Ok(())
    }

    async fn upload_file(&self, selector: &str, path: &Path) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("找不到文件输入框: {}", selector))?;

        let absolute = std::fs::canonicalize(path)
            .with_context(|| format!("简历文件不存在: {}", path.display()))?;

        let params = SetFileInputFilesParams::builder()
            .file(absolute.to_string_lossy().to_string())
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(anyhow::Error::msg)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.page
            .save_screenshot(ScreenshotParams::builder().full_page(true).build(), path)
            .await
            .with_context(|| format!("截图失败: {}", path.display()))?;
        Ok(())
    }

    async fn question_blocks(&self, container_selector: &str) -> Result<Vec<QuestionBlock>> {
        self.eval_with_selector(JS_QUESTION_BLOCKS, container_selector)
            .await
    }
}
