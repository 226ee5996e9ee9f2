//! 提交结果校验 - 业务能力层
//!
//! 只根据提交后的页面状态给出置信度分级，不关心投递流程。
//!
//! 判定顺序：
//! 1. 硬信号（URL 片段 → 页面文字 → DOM 标记），任意一条命中即 `hard`
//! 2. 表单已不可见 → `soft`
//! 3. 表单仍可见且有错误提示 → `none`，附带错误提示文本
//! 4. 表单仍可见且无错误提示 → `none`
//! 5. 未登记的平台 → `none`
//! 6. 检查过程中的任何错误或超时 → `none`，不会向上抛出

use anyhow::Result;
use chrono::Local;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::infrastructure::FormPage;
use crate::models::VerificationResult;
use crate::platforms::{ConfirmationSignals, PageStateSelectors, PlatformConfig};

/// 单个平台的校验依据
#[derive(Debug, Clone, Default)]
pub struct VerificationTable {
    pub signals: ConfirmationSignals,
    pub page_state: PageStateSelectors,
}

/// 提交结果校验器
#[derive(Debug, Clone)]
pub struct ApplyVerifier {
    tables: HashMap<String, VerificationTable>,
    inspect_timeout: Duration,
}

impl ApplyVerifier {
    pub fn new(inspect_timeout: Duration) -> Self {
        Self {
            tables: HashMap::new(),
            inspect_timeout,
        }
    }

    /// 用已加载的平台配置构建校验表
    pub fn from_configs<'a>(
        configs: impl IntoIterator<Item = &'a PlatformConfig>,
        inspect_timeout: Duration,
    ) -> Self {
        let mut verifier = Self::new(inspect_timeout);
        for config in configs {
            verifier.register(
                &config.platform,
                config.confirmation_signals.clone(),
                config.page_state.clone(),
            );
        }
        verifier
    }

    pub fn register(
        &mut self,
        platform: &str,
        signals: ConfirmationSignals,
        page_state: PageStateSelectors,
    ) {
        self.tables.insert(
            platform.to_lowercase(),
            VerificationTable {
                signals,
                page_state,
            },
        );
    }

    pub fn knows(&self, platform: &str) -> bool {
        self.tables.contains_key(&platform.to_lowercase())
    }

    /// 判断提交是否成功
    ///
    /// `context` 用于截图文件名（通常是申请 ID）
    pub async fn verify<P: FormPage + ?Sized>(
        &self,
        page: &P,
        platform: &str,
        context: &str,
        logs_dir: Option<&Path>,
    ) -> VerificationResult {
        let Some(table) = self.tables.get(&platform.to_lowercase()) else {
            warn!("未登记的平台 {}，无法校验提交结果", platform);
            return VerificationResult::unconfirmed(
                false,
                Vec::new(),
                format!(
                    "unrecognized platform '{}': no confirmation signals registered",
                    platform
                ),
            );
        };

        let mut result = match timeout(self.inspect_timeout, classify(page, table)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!("{} 校验过程出错: {:#}", context, e);
                VerificationResult::unconfirmed(
                    false,
                    Vec::new(),
                    format!("verification fault: {:#}", e),
                )
            }
            Err(_) => {
                warn!("{} 校验超时", context);
                VerificationResult::unconfirmed(
                    false,
                    Vec::new(),
                    format!(
                        "verification fault: page inspection timed out after {}s",
                        self.inspect_timeout.as_secs_f64()
                    ),
                )
            }
        };

        debug!(
            "{} 校验结果: {} ({})",
            context, result.confidence, result.reason
        );

        if result.is_verified {
            if let Some(dir) = logs_dir {
                result.screenshot_path = self.capture(page, dir, context, platform).await;
            }
        }

        result
    }

    /// 尽力截图留档，失败只记日志
    async fn capture<P: FormPage + ?Sized>(
        &self,
        page: &P,
        dir: &Path,
        context: &str,
        platform: &str,
    ) -> Option<String> {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("无法创建截图目录 {}: {}", dir.display(), e);
            return None;
        }

        let path = dir.join(screenshot_file_name(context, platform));
        match timeout(self.inspect_timeout, page.screenshot(&path)).await {
            Ok(Ok(())) => {
                info!("📸 已保存确认截图: {}", path.display());
                Some(path.display().to_string())
            }
            Ok(Err(e)) => {
                warn!("确认截图失败: {:#}", e);
                None
            }
            Err(_) => {
                warn!("确认截图超时");
                None
            }
        }
    }
}

/// 截图文件名：`{context}_{platform}_{timestamp}.png`
pub fn screenshot_file_name(context: &str, platform: &str) -> String {
    let safe_context: String = context
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!(
        "{}_{}_{}.png",
        safe_context,
        platform.to_lowercase(),
        Local::now().format("%Y%m%d_%H%M%S%3f")
    )
}

async fn classify<P: FormPage + ?Sized>(
    page: &P,
    table: &VerificationTable,
) -> Result<VerificationResult> {
    let signals = &table.signals;

    let url = page.current_url().await?;
    let url_lower = url.to_lowercase();
    for fragment in &signals.url_patterns {
        if !fragment.is_empty() && url_lower.contains(&fragment.to_lowercase()) {
            return Ok(VerificationResult::hard(
                format!("url:{}", fragment),
                format!("confirmation url fragment '{}' found in {}", fragment, url),
            ));
        }
    }

    let body = page.body_text().await?.to_lowercase();
    for phrase in &signals.dom_text {
        if !phrase.is_empty() && body.contains(&phrase.to_lowercase()) {
            return Ok(VerificationResult::hard(
                format!("text:{}", phrase),
                format!("confirmation phrase '{}' found in page text", phrase),
            ));
        }
    }

    for selector in &signals.dom_selectors {
        if page.exists(selector).await? {
            return Ok(VerificationResult::hard(
                format!("selector:{}", selector),
                format!("confirmation element '{}' present", selector),
            ));
        }
    }

    let mut form_visible = false;
    for selector in &table.page_state.form {
        if page.is_visible(selector).await? {
            form_visible = true;
            break;
        }
    }

    if !form_visible {
        return Ok(VerificationResult::soft(
            "no confirmation signal, but the application form is no longer visible",
        ));
    }

    let mut banners = Vec::new();
    for selector in &table.page_state.error_banners {
        banners.extend(page.texts(selector).await?);
    }

    if !banners.is_empty() {
        return Ok(VerificationResult::unconfirmed(
            true,
            banners,
            "application form still visible with error banner(s)",
        ));
    }

    Ok(VerificationResult::unconfirmed(
        true,
        Vec::new(),
        "application form still visible without confirmation or error; submission stalled",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Confidence;
    use crate::test_support::FakePage;

    fn verifier() -> ApplyVerifier {
        let mut verifier = ApplyVerifier::new(Duration::from_millis(200));
        verifier.register(
            "workday",
            ConfirmationSignals {
                url_patterns: vec!["/thank-you".to_string()],
                dom_text: vec!["Application Submitted".to_string()],
                dom_selectors: vec!["[data-automation-id='congratulationsPopup']".to_string()],
            },
            PageStateSelectors {
                form: vec!["form#apply".to_string()],
                error_banners: vec![".error-banner".to_string()],
                ..Default::default()
            },
        );
        verifier
    }

    const FORM_URL: &str = "https://acme.wd5.myworkdayjobs.com/apply";

    #[tokio::test]
    async fn test_url_signal_is_hard() {
        let page = FakePage::new("https://acme.wd5.myworkdayjobs.com/Thank-You").with_element("form#apply");
        let result = verifier().verify(&page, "workday", "app-1", None).await;

        assert_eq!(result.confidence, Confidence::Hard);
        assert!(result.is_verified);
        assert_eq!(result.signal_matched.as_deref(), Some("url:/thank-you"));
    }

    #[tokio::test]
    async fn test_text_signal_is_hard() {
        let page = FakePage::new(FORM_URL).with_body("Your application submitted. APPLICATION SUBMITTED!");
        let result = verifier().verify(&page, "Workday", "app-1", None).await;

        assert_eq!(result.confidence, Confidence::Hard);
        assert_eq!(
            result.signal_matched.as_deref(),
            Some("text:Application Submitted")
        );
    }

    #[tokio::test]
    async fn test_dom_marker_is_hard() {
        let page = FakePage::new(FORM_URL)
            .with_element("form#apply")
            .with_element("[data-automation-id='congratulationsPopup']");
        let result = verifier().verify(&page, "workday", "app-1", None).await;

        assert!(result.is_verified);
        assert!(result.signal_matched.unwrap().starts_with("selector:"));
    }

    #[tokio::test]
    async fn test_form_gone_is_soft() {
        let page = FakePage::new(FORM_URL).with_body("Loading...");
        let result = verifier().verify(&page, "workday", "app-1", None).await;

        assert_eq!(result.confidence, Confidence::Soft);
        assert!(!result.is_verified);
        assert!(!result.form_still_visible);
    }

    #[tokio::test]
    async fn test_hidden_form_counts_as_gone() {
        let page = FakePage::new(FORM_URL).with_hidden("form#apply");
        let result = verifier().verify(&page, "workday", "app-1", None).await;

        assert_eq!(result.confidence, Confidence::Soft);
    }

    #[tokio::test]
    async fn test_error_banner_is_none_with_banners() {
        let page = FakePage::new(FORM_URL)
            .with_element("form#apply")
            .with_text(".error-banner", "  Phone number is invalid ");
        let result = verifier().verify(&page, "workday", "app-1", None).await;

        assert_eq!(result.confidence, Confidence::Unconfirmed);
        assert!(result.form_still_visible);
        assert_eq!(result.error_banners, vec!["Phone number is invalid"]);
    }

    #[tokio::test]
    async fn test_stall_is_none_without_banners() {
        let page = FakePage::new(FORM_URL).with_element("form#apply");
        let result = verifier().verify(&page, "workday", "app-1", None).await;

        assert_eq!(result.confidence, Confidence::Unconfirmed);
        assert!(result.form_still_visible);
        assert!(!result.has_error_banners());
        assert!(result.reason.contains("stalled"));
    }

    #[tokio::test]
    async fn test_unknown_platform_is_none() {
        let page = FakePage::new("https://jobs.taleo.net/thank-you");
        let result = verifier().verify(&page, "taleo", "app-1", None).await;

        assert_eq!(result.confidence, Confidence::Unconfirmed);
        assert!(result.reason.contains("taleo"));
    }

    #[tokio::test]
    async fn test_page_fault_never_propagates() {
        let page = FakePage::new(FORM_URL).broken();
        let result = verifier().verify(&page, "workday", "app-1", None).await;

        assert_eq!(result.confidence, Confidence::Unconfirmed);
        assert!(result.reason.contains("verification fault"));
    }

    #[tokio::test]
    async fn test_hanging_inspection_times_out() {
        let page = FakePage::new(FORM_URL).hang_on("form#apply");
        let result = verifier().verify(&page, "workday", "app-1", None).await;

        assert_eq!(result.confidence, Confidence::Unconfirmed);
        assert!(result.reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_hard_result_saves_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let page = FakePage::new("https://acme.wd5.myworkdayjobs.com/thank-you");
        let result = verifier()
            .verify(&page, "workday", "app/1", Some(dir.path()))
            .await;

        let path = result.screenshot_path.expect("screenshot recorded");
        assert!(path.contains("app_1_workday_"));
        assert!(Path::new(&path).exists());
    }

    #[tokio::test]
    async fn test_screenshot_failure_keeps_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let page = FakePage::new("https://acme.wd5.myworkdayjobs.com/thank-you").screenshots_fail();
        let result = verifier()
            .verify(&page, "workday", "app-1", Some(dir.path()))
            .await;

        assert!(result.is_verified);
        assert!(result.screenshot_path.is_none());
    }

    #[tokio::test]
    async fn test_soft_result_takes_no_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let page = FakePage::new(FORM_URL);
        let result = verifier()
            .verify(&page, "workday", "app-1", Some(dir.path()))
            .await;

        assert!(result.screenshot_path.is_none());
        assert!(page.actions().is_empty());
    }
}
