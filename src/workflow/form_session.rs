//! 表单会话 - 流程层
//!
//! 把"逐个尝试候选选择器"和"每一步都有超时"这两件事收拢在一处，
//! 平台 runner 的各个步骤都基于它实现
//!
//! 多页表单会对每一页重复执行同一组步骤，已完成的字段记在 `done` 里，
//! 翻页后不会重复填写；必填字段是否落空统一在提交前由 `ensure_required` 判断

use anyhow::Result as AnyResult;
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use tokio::time::timeout;
use tracing::debug;

use crate::infrastructure::{FormPage, QuestionBlock};
use crate::models::AttemptResultBuilder;
use crate::platforms::PlatformConfig;

use super::apply_ctx::ApplyCtx;
use super::halt::Halt;

/// 单次投递过程中的页面会话
pub struct FormSession<'a, P: FormPage + ?Sized> {
    pub page: &'a P,
    pub config: &'a PlatformConfig,
    pub ctx: &'a ApplyCtx<'a>,
    pub builder: AttemptResultBuilder,
    done: HashSet<String>,
}

impl<'a, P: FormPage + ?Sized> FormSession<'a, P> {
    pub fn new(
        page: &'a P,
        config: &'a PlatformConfig,
        ctx: &'a ApplyCtx<'a>,
        builder: AttemptResultBuilder,
    ) -> Self {
        Self {
            page,
            config,
            ctx,
            builder,
            done: HashSet::new(),
        }
    }

    /// 本次投递中该字段是否已经处理过
    pub fn is_done(&self, field: &str) -> bool {
        self.done.contains(field)
    }

    pub fn mark_done(&mut self, field: impl Into<String>) {
        self.done.insert(field.into());
    }

    /// 提交前检查：必填字段仍未处理时中止为 `SelectorNotFound`
    pub fn ensure_required(&self, expected: &[&str]) -> Result<(), Halt> {
        match expected
            .iter()
            .find(|field| self.config.is_required(self.ctx.platform, field) && !self.is_done(field))
        {
            Some(field) => Err(Halt::SelectorNotFound(field.to_string())),
            None => Ok(()),
        }
    }

    /// 给浏览器操作加上超时，并把失败翻译成 `Halt`
    pub async fn guarded<T, F>(&self, step: &str, fut: F) -> Result<T, Halt>
    where
        F: Future<Output = AnyResult<T>>,
    {
        match timeout(self.ctx.settings.step_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Halt::Driver {
                step: step.to_string(),
                message: format!("{:#}", e),
            }),
            Err(_) => Err(Halt::Timeout(step.to_string())),
        }
    }

    /// 返回第一个在页面上存在的候选选择器
    pub async fn resolve(&self, field: &str) -> Result<Option<String>, Halt> {
        for candidate in self.config.candidates(field) {
            let step = format!("resolve {}", field);
            if self.guarded(&step, self.page.exists(candidate)).await? {
                debug!("{} 字段 {} 命中选择器 {}", self.ctx, field, candidate);
                return Ok(Some(candidate.clone()));
            }
        }
        Ok(None)
    }

    /// 必填字段：所有候选都未命中时中止为 `SelectorNotFound`
    pub async fn resolve_required(&self, field: &str) -> Result<String, Halt> {
        self.resolve(field)
            .await?
            .ok_or_else(|| Halt::SelectorNotFound(field.to_string()))
    }

    /// 填写字段；当前页没有该字段时跳过并返回 false，已填过的字段不再重复填写
    pub async fn fill_field(&mut self, field: &str, value: &str) -> Result<bool, Halt> {
        if self.is_done(field) {
            return Ok(true);
        }
        let Some(selector) = self.resolve(field).await? else {
            return Ok(false);
        };

        self.guarded(&format!("fill {}", field), self.page.fill(&selector, value))
            .await?;
        self.builder.field_filled(field);
        self.mark_done(field);
        Ok(true)
    }

    /// 点击必填的按钮
    pub async fn click_required(&mut self, field: &str) -> Result<(), Halt> {
        let selector = self.resolve_required(field).await?;
        self.guarded(&format!("click {}", field), self.page.click(&selector))
            .await?;
        self.builder.step(format!("click:{}", field));
        Ok(())
    }

    /// 点击可选按钮，不存在时静默跳过
    pub async fn click_optional(&mut self, field: &str) -> Result<bool, Halt> {
        let Some(selector) = self.resolve(field).await? else {
            return Ok(false);
        };
        self.guarded(&format!("click {}", field), self.page.click(&selector))
            .await?;
        self.builder.step(format!("click:{}", field));
        Ok(true)
    }

    /// 勾选可选的复选框，不存在时静默跳过
    pub async fn check_optional(&mut self, field: &str) -> Result<bool, Halt> {
        if self.is_done(field) {
            return Ok(true);
        }
        let Some(selector) = self.resolve(field).await? else {
            return Ok(false);
        };
        self.guarded(&format!("check {}", field), self.page.check(&selector))
            .await?;
        self.builder.step(format!("check:{}", field));
        self.mark_done(field);
        Ok(true)
    }

    /// 字段的任一候选是否可见
    pub async fn visible(&self, field: &str) -> Result<bool, Halt> {
        for candidate in self.config.candidates(field) {
            let step = format!("visible {}", field);
            if self.guarded(&step, self.page.is_visible(candidate)).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 标签式输入框：每一项输入后按一次确认键
    pub async fn type_each(&mut self, field: &str, items: &[String], key: &str) -> Result<usize, Halt> {
        if self.is_done(field) {
            return Ok(0);
        }
        let Some(selector) = self.resolve(field).await? else {
            return Ok(0);
        };
        for item in items {
            self.guarded(
                &format!("type {}", field),
                self.page.type_and_press(&selector, item, key),
            )
            .await?;
        }
        if !items.is_empty() {
            self.builder.field_filled(field);
        }
        self.mark_done(field);
        Ok(items.len())
    }

    /// 上传文件；当前页没有上传框时返回 false
    pub async fn upload(&mut self, field: &str, path: &Path) -> Result<bool, Halt> {
        if self.is_done(field) {
            return Ok(false);
        }
        let Some(selector) = self.resolve(field).await? else {
            return Ok(false);
        };
        self.guarded(
            &format!("upload {}", field),
            self.page.upload_file(&selector, path),
        )
        .await?;
        self.builder.field_filled(field);
        self.mark_done(field);
        Ok(true)
    }

    pub async fn navigate(&mut self, url: &str) -> Result<(), Halt> {
        self.guarded("navigate", self.page.goto(url)).await?;
        self.builder.step("navigate");
        Ok(())
    }

    /// 页面上是否出现了验证码
    pub async fn captcha_present(&self) -> Result<bool, Halt> {
        for selector in &self.config.page_state.captcha {
            if self.guarded("captcha check", self.page.exists(selector)).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 返回命中的"职位已关闭"提示
    pub async fn closed_notice(&self) -> Result<Option<String>, Halt> {
        if self.config.page_state.closed_text.is_empty() {
            return Ok(None);
        }
        let body = self
            .guarded("closed check", self.page.body_text())
            .await?
            .to_lowercase();
        Ok(self
            .config
            .page_state
            .closed_text
            .iter()
            .find(|text| body.contains(&text.to_lowercase()))
            .cloned())
    }

    /// 收集所有候选容器下的筛选问题
    pub async fn question_blocks(&self, field: &str) -> Result<Vec<QuestionBlock>, Halt> {
        let mut blocks = Vec::new();
        for container in self.config.candidates(field) {
            let found = self
                .guarded("collect questions", self.page.question_blocks(container))
                .await?;
            if !found.is_empty() {
                blocks = found;
                break;
            }
        }
        Ok(blocks)
    }

    /// 直接按选择器填写（筛选问题的输入框由页面动态生成）
    pub async fn fill_selector(&mut self, selector: &str, value: &str) -> Result<(), Halt> {
        self.guarded("fill question", self.page.fill(selector, value))
            .await
    }
}
