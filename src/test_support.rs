//! 测试用的内存页面
//!
//! 用 HashMap 模拟 DOM，点击可以触发预设的页面变化（跳转、元素出现/消失）

use crate::infrastructure::{FormPage, QuestionBlock};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub visible: bool,
    pub text: String,
    pub value: String,
    pub checked: bool,
}

/// 点击某个元素后页面发生的变化
#[derive(Debug, Clone, Default)]
pub struct ClickEffect {
    pub url: Option<String>,
    pub body: Option<String>,
    pub remove: Vec<String>,
    pub add: Vec<(String, FakeElement)>,
}

#[derive(Default)]
struct FakeState {
    url: String,
    body: String,
    elements: HashMap<String, FakeElement>,
    effects: HashMap<String, ClickEffect>,
    questions: HashMap<String, Vec<QuestionBlock>>,
    actions: Vec<String>,
    broken: bool,
    hang: HashSet<String>,
    screenshot_fails: bool,
}

pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                url: url.to_string(),
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn with_body(self, body: &str) -> Self {
        self.lock().body = body.to_string();
        self
    }

    pub fn with_element(self, selector: &str) -> Self {
        self.lock().elements.insert(
            selector.to_string(),
            FakeElement {
                visible: true,
                ..Default::default()
            },
        );
        self
    }

    pub fn with_hidden(self, selector: &str) -> Self {
        self.lock()
            .elements
            .insert(selector.to_string(), FakeElement::default());
        self
    }

    pub fn with_text(self, selector: &str, text: &str) -> Self {
        self.lock().elements.insert(
            selector.to_string(),
            FakeElement {
                visible: true,
                text: text.to_string(),
                ..Default::default()
            },
        );
        self
    }

    pub fn on_click(self, selector: &str, effect: ClickEffect) -> Self {
        self.lock().effects.insert(selector.to_string(), effect);
        self
    }

    pub fn with_questions(self, container: &str, blocks: Vec<QuestionBlock>) -> Self {
        {
            let mut state = self.lock();
            for block in &blocks {
                state.elements.insert(
                    block.input_selector.clone(),
                    FakeElement {
                        visible: true,
                        ..Default::default()
                    },
                );
            }
            state.questions.insert(container.to_string(), blocks);
        }
        self
    }

    /// 之后所有操作都返回错误，模拟页面崩溃
    pub fn broken(self) -> Self {
        self.lock().broken = true;
        self
    }

    /// 对该选择器的任何操作都永不返回
    pub fn hang_on(self, selector: &str) -> Self {
        self.lock().hang.insert(selector.to_string());
        self
    }

    pub fn screenshots_fail(self) -> Self {
        self.lock().screenshot_fails = true;
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.lock().actions.clone()
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.lock().elements.get(selector).map(|e| e.value.clone())
    }

    pub fn is_checked(&self, selector: &str) -> bool {
        self.lock()
            .elements
            .get(selector)
            .map(|e| e.checked)
            .unwrap_or(false)
    }

    async fn enter(&self, selector: &str) -> Result<()> {
        let (broken, hang) = {
            let state = self.lock();
            (state.broken, state.hang.contains(selector))
        };
        if broken {
            bail!("page crashed");
        }
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn require(&self, selector: &str) -> Result<()> {
        if !self.lock().elements.contains_key(selector) {
            bail!("no element matches {}", selector);
        }
        Ok(())
    }

    fn record(&self, action: String) {
        self.lock().actions.push(action);
    }
}

#[async_trait]
impl FormPage for FakePage {
    async fn current_url(&self) -> Result<String> {
        self.enter("").await?;
        Ok(self.lock().url.clone())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.enter(url).await?;
        self.record(format!("goto:{}", url));
        self.lock().url = url.to_string();
        Ok(())
    }

    async fn body_text(&self) -> Result<String> {
        self.enter("").await?;
        Ok(self.lock().body.clone())
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        self.enter(selector).await?;
        Ok(self.lock().elements.contains_key(selector))
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        self.enter(selector).await?;
        Ok(self
            .lock()
            .elements
            .get(selector)
            .map(|e| e.visible)
            .unwrap_or(false))
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        self.enter(selector).await?;
        Ok(self
            .lock()
            .elements
            .get(selector)
            .map(|e| e.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .into_iter()
            .collect())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.enter(selector).await?;
        self.require(selector)?;
        self.record(format!("fill:{}={}", selector, value));
        if let Some(element) = self.lock().elements.get_mut(selector) {
            element.value = value.to_string();
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.enter(selector).await?;
        self.require(selector)?;
        self.record(format!("click:{}", selector));

        let mut state = self.lock();
        if let Some(effect) = state.effects.get(selector).cloned() {
            if let Some(url) = effect.url {
                state.url = url;
            }
            if let Some(body) = effect.body {
                state.body = body;
            }
            for removed in &effect.remove {
                state.elements.remove(removed);
            }
            for (added, element) in effect.add {
                state.elements.insert(added, element);
            }
        }
        Ok(())
    }

    async fn check(&self, selector: &str) -> Result<()> {
        self.enter(selector).await?;
        self.require(selector)?;
        self.record(format!("check:{}", selector));
        if let Some(element) = self.lock().elements.get_mut(selector) {
            element.checked = true;
        }
        Ok(())
    }

    async fn type_and_press(&self, selector: &str, text: &str, key: &str) -> Result<()> {
        self.enter(selector).await?;
        self.require(selector)?;
        self.record(format!("type:{}={}+{}", selector, text, key));
        Ok(())
    }

    async fn upload_file(&self, selector: &str, path: &Path) -> Result<()> {
        self.enter(selector).await?;
        self.require(selector)?;
        self.record(format!("upload:{}={}", selector, path.display()));
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.enter("").await?;
        if self.lock().screenshot_fails {
            bail!("screenshot capture failed");
        }
        std::fs::write(path, b"fake-png")?;
        self.record(format!("screenshot:{}", path.display()));
        Ok(())
    }

    async fn question_blocks(&self, container_selector: &str) -> Result<Vec<QuestionBlock>> {
        self.enter(container_selector).await?;
        Ok(self
            .lock()
            .questions
            .get(container_selector)
            .cloned()
            .unwrap_or_default())
    }
}
