//! Workday 平台步骤
//!
//! Workday 的申请表是多页向导：先点 Apply → Apply Manually，
//! 之后每页底部是 "Save and Continue"，最后一页才出现提交按钮

use tracing::{debug, info};

use crate::infrastructure::FormPage;
use crate::workflow::{FormSession, Halt};

use super::config::fields;

/// 入口：Apply 按钮，然后选择手动填写
pub async fn open_application<P: FormPage + ?Sized>(
    session: &mut FormSession<'_, P>,
) -> Result<(), Halt> {
    if session.click_optional(fields::APPLY_BUTTON).await? {
        debug!("{} 已点击 Apply", session.ctx);
    }
    if session.click_optional(fields::APPLY_MANUALLY).await? {
        debug!("{} 已选择手动填写", session.ctx);
    }
    Ok(())
}

/// 短信通知同意框
pub async fn tick_sms_consent<P: FormPage + ?Sized>(
    session: &mut FormSession<'_, P>,
) -> Result<bool, Halt> {
    session.check_optional(fields::SMS_CONSENT).await
}

/// 技能标签输入框：每个技能输入后按 Enter 确认
pub async fn enter_skills<P: FormPage + ?Sized>(
    session: &mut FormSession<'_, P>,
    skills: &[String],
) -> Result<usize, Halt> {
    let entered = session.type_each(fields::SKILLS_INPUT, skills, "Enter").await?;
    if entered > 0 {
        info!("{} 已录入 {} 项技能", session.ctx, entered);
    }
    Ok(entered)
}

/// 提交按钮尚未出现时点击 "下一页"
///
/// 返回 false 表示已到最后一页，或页面上没有下一页按钮
pub async fn advance_page<P: FormPage + ?Sized>(
    session: &mut FormSession<'_, P>,
) -> Result<bool, Halt> {
    if session.visible(fields::SUBMIT).await? {
        return Ok(false);
    }
    session.click_optional(fields::NEXT_BUTTON).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicationTask, AttemptResult, AttemptStatus};
    use crate::platforms::{Platform, PlatformConfig, PlatformRunner};
    use crate::services::answer_bank::AnswerBankFile;
    use crate::services::{AnswerBank, ApplyVerifier};
    use crate::test_support::{ClickEffect, FakeElement, FakePage};
    use crate::workflow::{ApplyCtx, ApplySettings};
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> PlatformConfig {
        toml::from_str(
            r##"
            version = "1"
            platform = "workday"
            url_patterns = ["myworkdayjobs.com"]

            [selectors]
            first_name = ["[data-automation-id='legalNameSection_firstName']"]
            last_name = ["[data-automation-id='legalNameSection_lastName']"]
            email = ["[data-automation-id='email']"]
            phone = ["[data-automation-id='phone-number']"]
            resume_upload = ["[data-automation-id='file-upload-input-ref']"]
            submit = ["[data-automation-id='bottom-navigation-submit-button']"]
            apply_button = ["[data-automation-id='adventureButton']"]
            apply_manually = ["[data-automation-id='applyManually']"]
            next_button = ["[data-automation-id='bottom-navigation-next-button']"]
            sms_consent = ["[data-automation-id='smsConsent']"]
            skills_input = ["[data-automation-id='skillsInput']"]

            [confirmation_signals]
            dom_text = ["application submitted"]
            "##,
        )
        .unwrap()
    }

    fn task() -> ApplicationTask {
        toml::from_str(
            r#"
            id = "wd-1"
            job_url = "https://acme.wd5.myworkdayjobs.com/en-US/careers/job/123"
            market = "US"
            "#,
        )
        .unwrap()
    }

    const NEXT: &str = "[data-automation-id='bottom-navigation-next-button']";
    const SUBMIT: &str = "[data-automation-id='bottom-navigation-submit-button']";
    const RESUME: &str = "[data-automation-id='file-upload-input-ref']";

    fn answers() -> AnswerBank {
        let mut content =
            String::from("version = \"test\"\n[resume_formats]\ndefault = \"pdf\"\n");
        for market in ["US", "UK", "CA", "AU", "DE", "FR", "IN"] {
            content.push_str(&format!(
                "[personal_info.{market}]\nfirst_name = \"Ada\"\nlast_name = \"Lovelace\"\n\
                 email = \"ada@example.com\"\nphone = \"5550100\"\ncity = \"Austin\"\n\
                 state = \"TX\"\nzip = \"78701\"\ncountry = \"US\"\n"
            ));
        }
        let file: AnswerBankFile = toml::from_str(&content).unwrap();
        AnswerBank::from_file(file).unwrap()
    }

    fn visible() -> FakeElement {
        FakeElement {
            visible: true,
            ..Default::default()
        }
    }

    /// 第一页只有个人信息和下一页按钮，点击后才出现简历上传和提交按钮
    fn two_page_form(second_page: Vec<(String, FakeElement)>) -> FakePage {
        FakePage::new("about:blank")
            .with_element("[data-automation-id='legalNameSection_firstName']")
            .with_element("[data-automation-id='legalNameSection_lastName']")
            .with_element("[data-automation-id='email']")
            .with_element("[data-automation-id='phone-number']")
            .with_element(NEXT)
            .on_click(
                NEXT,
                ClickEffect {
                    remove: vec![NEXT.to_string()],
                    add: second_page,
                    ..Default::default()
                },
            )
            .on_click(
                SUBMIT,
                ClickEffect {
                    body: Some("Application Submitted".to_string()),
                    ..Default::default()
                },
            )
    }

    async fn run(page: &FakePage) -> AttemptResult {
        let config = config();
        let verifier = Arc::new(ApplyVerifier::from_configs([&config], Duration::from_millis(200)));
        let runner = PlatformRunner::new(Platform::Workday, config, verifier).unwrap();
        let mut task = task();
        task.resume.pdf_path = Some(PathBuf::from("/tmp/cv.pdf"));
        let settings = ApplySettings {
            step_timeout: Duration::from_millis(200),
            settle_delay: Duration::ZERO,
            logs_dir: None,
        };
        let answers = answers();
        let ctx = ApplyCtx::new(&task, 1, Platform::Workday, &settings);
        runner.apply(page, &task.resume, &answers, &ctx).await
    }

    #[tokio::test]
    async fn test_quirks_are_noops_when_absent() {
        let page = FakePage::new("https://acme.wd5.myworkdayjobs.com/apply");
        let config = config();
        let task = task();
        let settings = ApplySettings::default();
        let ctx = ApplyCtx::new(&task, 1, Platform::Workday, &settings);
        let mut session = FormSession::new(&page, &config, &ctx, AttemptResult::builder());

        open_application(&mut session).await.unwrap();
        assert!(!tick_sms_consent(&mut session).await.unwrap());
        let skills = vec!["Rust".to_string()];
        assert_eq!(enter_skills(&mut session, &skills).await.unwrap(), 0);
        assert!(!advance_page(&mut session).await.unwrap());
        assert!(page.actions().is_empty());
    }

    #[tokio::test]
    async fn test_entry_buttons_are_clicked_in_order() {
        let page = FakePage::new("https://acme.wd5.myworkdayjobs.com/job/123")
            .with_element("[data-automation-id='adventureButton']")
            .on_click(
                "[data-automation-id='adventureButton']",
                ClickEffect {
                    add: vec![(
                        "[data-automation-id='applyManually']".to_string(),
                        FakeElement {
                            visible: true,
                            ..Default::default()
                        },
                    )],
                    ..Default::default()
                },
            );
        let config = config();
        let task = task();
        let settings = ApplySettings::default();
        let ctx = ApplyCtx::new(&task, 1, Platform::Workday, &settings);
        let mut session = FormSession::new(&page, &config, &ctx, AttemptResult::builder());

        open_application(&mut session).await.unwrap();
        assert_eq!(
            page.actions(),
            vec![
                "click:[data-automation-id='adventureButton']",
                "click:[data-automation-id='applyManually']",
            ]
        );
    }

    #[tokio::test]
    async fn test_sms_consent_and_skills() {
        let page = FakePage::new("https://acme.wd5.myworkdayjobs.com/apply")
            .with_element("[data-automation-id='smsConsent']")
            .with_element("[data-automation-id='skillsInput']");
        let config = config();
        let task = task();
        let settings = ApplySettings::default();
        let ctx = ApplyCtx::new(&task, 1, Platform::Workday, &settings);
        let mut session = FormSession::new(&page, &config, &ctx, AttemptResult::builder());

        assert!(tick_sms_consent(&mut session).await.unwrap());
        assert!(page.is_checked("[data-automation-id='smsConsent']"));

        let skills = vec!["Rust".to_string(), "Tokio".to_string()];
        assert_eq!(enter_skills(&mut session, &skills).await.unwrap(), 2);
        let typed: Vec<_> = page
            .actions()
            .into_iter()
            .filter(|a| a.starts_with("type:"))
            .collect();
        assert_eq!(
            typed,
            vec![
                "type:[data-automation-id='skillsInput']=Rust+Enter",
                "type:[data-automation-id='skillsInput']=Tokio+Enter",
            ]
        );
    }

    #[tokio::test]
    async fn test_advance_stops_when_submit_visible() {
        let page = FakePage::new("https://acme.wd5.myworkdayjobs.com/apply")
            .with_element(NEXT)
            .on_click(
                NEXT,
                ClickEffect {
                    remove: vec![NEXT.to_string()],
                    add: vec![(
                        SUBMIT.to_string(),
                        FakeElement {
                            visible: true,
                            ..Default::default()
                        },
                    )],
                    ..Default::default()
                },
            );
        let config = config();
        let task = task();
        let settings = ApplySettings::default();
        let ctx = ApplyCtx::new(&task, 1, Platform::Workday, &settings);
        let mut session = FormSession::new(&page, &config, &ctx, AttemptResult::builder());

        assert!(advance_page(&mut session).await.unwrap());
        assert!(!advance_page(&mut session).await.unwrap());
        assert_eq!(page.actions(), vec![format!("click:{}", NEXT)]);
    }

    #[tokio::test]
    async fn test_resume_on_later_page_is_uploaded() {
        let page = two_page_form(vec![
            (RESUME.to_string(), visible()),
            (SUBMIT.to_string(), visible()),
        ]);

        let result = run(&page).await;

        assert_eq!(result.status, AttemptStatus::AppliedVerified);
        let actions = page.actions();
        let next_at = actions
            .iter()
            .position(|a| a == &format!("click:{}", NEXT))
            .unwrap();
        let upload_at = actions
            .iter()
            .position(|a| a == &format!("upload:{}=/tmp/cv.pdf", RESUME))
            .unwrap();
        assert!(next_at < upload_at);
        assert_eq!(
            actions
                .iter()
                .filter(|a| *a == &format!("click:{}", NEXT))
                .count(),
            1
        );
        // 第一页填过的字段翻页后不再重复填写
        assert_eq!(
            actions
                .iter()
                .filter(|a| a.starts_with("fill:[data-automation-id='email']"))
                .count(),
            1
        );
        assert_eq!(actions.last(), Some(&format!("click:{}", SUBMIT)));
    }

    #[tokio::test]
    async fn test_required_field_missing_on_last_page_halts_before_submit() {
        let page = two_page_form(vec![(SUBMIT.to_string(), visible())]);

        let result = run(&page).await;

        assert_eq!(result.status, AttemptStatus::PausedSelectorFailed);
        assert!(result.errors[0].contains("resume_upload"));
        let actions = page.actions();
        assert!(actions.contains(&format!("click:{}", NEXT)));
        assert!(!actions.contains(&format!("click:{}", SUBMIT)));
    }
}
