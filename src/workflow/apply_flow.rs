//! 单条申请的投递流程 - 流程层
//!
//! 流程顺序：
//! 1. 打开职位页，检查职位是否关闭、是否出现验证码
//! 2. 平台入口步骤（如 Workday 的 Apply 按钮）
//! 3. 逐页处理表单：个人信息 → 可选字段 → 简历上传 → 平台特有步骤 → 筛选问题，
//!    然后翻页，直到提交按钮出现
//! 4. 提交前确认所有必填字段都已处理
//! 5. 提交 → 等待页面稳定 → 校验
//!
//! 任一步骤中止都会被翻译成带类型的 `AttemptStatus`，不会向上抛出

use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::infrastructure::FormPage;
use crate::models::{
    AttemptResult, AttemptStatus, Confidence, PersonalInfo, ResumeContent, VerificationResult,
};
use crate::platforms::config::fields;
use crate::platforms::PlatformRunner;
use crate::services::verifier::screenshot_file_name;
use crate::services::AnswerBank;
use crate::utils::logging::truncate_text;

use super::apply_ctx::ApplyCtx;
use super::form_session::FormSession;
use super::halt::Halt;

/// 多页表单最多翻页次数
const MAX_FORM_PAGES: usize = 8;

/// 执行一次完整投递
pub async fn run_apply<P: FormPage + ?Sized>(
    runner: &PlatformRunner,
    page: &P,
    resume: &ResumeContent,
    answers: &AnswerBank,
    ctx: &ApplyCtx<'_>,
) -> AttemptResult {
    let started = Instant::now();
    let builder = AttemptResult::builder().cost_usd(resume.cost_usd);
    let mut session = FormSession::new(page, runner.config(), ctx, builder);

    info!("{} 🚀 开始投递 {}", ctx, ctx.task.job_url);

    let outcome = drive(runner, &mut session, resume, answers).await;
    let status = match outcome {
        Ok(status) => status,
        Err(halt) => {
            warn!("{} ⚠️ 投递中止: {}", ctx, halt);
            session.builder.error(halt.to_string());
            capture_halt_screenshot(&mut session).await;
            halt.status()
        }
    };

    let duration = started.elapsed().as_secs_f64();
    info!("{} 投递结束: {} ({:.1}s)", ctx, status, duration);
    session.builder.finish(status, duration)
}

async fn drive<P: FormPage + ?Sized>(
    runner: &PlatformRunner,
    session: &mut FormSession<'_, P>,
    resume: &ResumeContent,
    answers: &AnswerBank,
) -> Result<AttemptStatus, Halt> {
    let ctx = session.ctx;

    session.navigate(&ctx.task.job_url).await?;
    ensure_page_open(session).await?;

    runner.open_application(session).await?;
    ensure_page_open(session).await?;

    let plan = FillPlan::prepare(runner, session, resume, answers)?;

    let mut pages = 1;
    loop {
        fill_current_page(runner, session, &plan, resume, answers).await?;
        if pages >= MAX_FORM_PAGES || !runner.advance_page(session).await? {
            break;
        }
        pages += 1;
        info!("{} 进入表单第 {} 页", ctx, pages);
    }

    session.ensure_required(&plan.expected_fields())?;

    if session.captcha_present().await? {
        return Err(Halt::Captcha);
    }

    info!("{} 📤 提交申请...", ctx);
    session.click_required(fields::SUBMIT).await?;
    tokio::time::sleep(ctx.settings.settle_delay).await;

    if session.captcha_present().await? {
        return Err(Halt::Captcha);
    }

    let verification = runner
        .verifier()
        .verify(
            session.page,
            ctx.platform.id(),
            ctx.application_id(),
            ctx.settings.logs_dir.as_deref(),
        )
        .await;
    session.builder.step(format!("verify:{}", verification.confidence));

    let confirmation_url = if verification.is_verified {
        session
            .guarded("read url", session.page.current_url())
            .await
            .ok()
    } else {
        None
    };

    Ok(fold_verification(session, &verification, confirmation_url))
}

/// 把校验结果折算为投递状态
///
/// - `hard` → `applied_verified`
/// - `soft` → `applied_soft`
/// - `none` 且有错误提示 → `failed_permanent`
/// - `none` 且无错误提示（表单仍在、没有确认）→ `paused_captcha`，交给人工，
///   不推动熔断器，申请留在队列中
pub fn status_for(verification: &VerificationResult) -> AttemptStatus {
    match verification.confidence {
        Confidence::Hard => AttemptStatus::AppliedVerified,
        Confidence::Soft => AttemptStatus::AppliedSoft,
        Confidence::Unconfirmed if verification.has_error_banners() => {
            AttemptStatus::FailedPermanent
        }
        Confidence::Unconfirmed => AttemptStatus::PausedCaptcha,
    }
}

fn fold_verification<P: FormPage + ?Sized>(
    session: &mut FormSession<'_, P>,
    verification: &VerificationResult,
    confirmation_url: Option<String>,
) -> AttemptStatus {
    let status = status_for(verification);
    let ctx = session.ctx;
    let builder = &mut session.builder;

    if let Some(path) = &verification.screenshot_path {
        builder.screenshot(path.clone());
    }

    match verification.confidence {
        Confidence::Hard => {
            builder.confirmation(verification.signal_matched.clone(), confirmation_url);
            info!("{} ✓ 已确认提交: {}", ctx, verification.reason);
        }
        Confidence::Soft => {
            info!("{} 提交结果待抽查: {}", ctx, verification.reason);
        }
        Confidence::Unconfirmed => {
            for banner in &verification.error_banners {
                builder.error(format!("error banner: {}", banner));
            }
            builder.error(format!("unverified submission: {}", verification.reason));
            warn!("{} ⚠️ 提交未确认: {}", ctx, verification.reason);
        }
    }

    status
}

async fn ensure_page_open<P: FormPage + ?Sized>(session: &FormSession<'_, P>) -> Result<(), Halt> {
    if let Some(notice) = session.closed_notice().await? {
        return Err(Halt::JobClosed(notice));
    }
    if session.captcha_present().await? {
        return Err(Halt::Captcha);
    }
    Ok(())
}

/// 投递前就能确定的数据：个人信息、简历文件
struct FillPlan<'a> {
    info: &'a PersonalInfo,
    resume_path: &'a Path,
    resume_format: &'static str,
    linkedin: bool,
    cover_letter: bool,
}

impl<'a> FillPlan<'a> {
    fn prepare<P: FormPage + ?Sized>(
        runner: &PlatformRunner,
        session: &FormSession<'_, P>,
        resume: &'a ResumeContent,
        answers: &'a AnswerBank,
    ) -> Result<Self, Halt> {
        let info = answers
            .get_personal_info(session.ctx.market())
            .map_err(|e| Halt::MissingData(e.to_string()))?;
        let format = answers.get_resume_format(runner.platform().id());
        let resume_path = resume
            .file_for(format)
            .ok_or_else(|| Halt::MissingData("resume file (pdf or docx)".to_string()))?;

        Ok(Self {
            info,
            resume_path,
            resume_format: format.as_str(),
            linkedin: resume.linkedin_url.is_some(),
            cover_letter: resume.cover_letter.is_some(),
        })
    }

    /// 本次投递打算填写的字段，提交前据此检查必填项
    fn expected_fields(&self) -> Vec<&'static str> {
        let mut expected: Vec<&'static str> = fields::PERSONAL_FIELDS
            .iter()
            .copied()
            .filter(|field| self.info.value_for(field).is_some())
            .collect();
        if self.linkedin {
            expected.push(fields::LINKEDIN);
        }
        if self.cover_letter {
            expected.push(fields::COVER_LETTER);
        }
        expected.push(fields::RESUME_UPLOAD);
        expected
    }
}

/// 在当前页上执行所有填写步骤，已完成的字段会被跳过
async fn fill_current_page<P: FormPage + ?Sized>(
    runner: &PlatformRunner,
    session: &mut FormSession<'_, P>,
    plan: &FillPlan<'_>,
    resume: &ResumeContent,
    answers: &AnswerBank,
) -> Result<(), Halt> {
    for field in fields::PERSONAL_FIELDS {
        if let Some(value) = plan.info.value_for(field) {
            session.fill_field(field, &value).await?;
        }
    }

    if let Some(linkedin) = &resume.linkedin_url {
        session.fill_field(fields::LINKEDIN, linkedin).await?;
    }
    if let Some(cover_letter) = &resume.cover_letter {
        session.fill_field(fields::COVER_LETTER, cover_letter).await?;
    }

    if session.upload(fields::RESUME_UPLOAD, plan.resume_path).await? {
        session.builder.step(format!("resume:{}", plan.resume_format));
    }

    runner.platform_steps(session, resume).await?;
    answer_questions(session, answers).await
}

/// 回答当前页的筛选问题
///
/// 必填问题需要人工时中止；可选问题留空并记入 errors
async fn answer_questions<P: FormPage + ?Sized>(
    session: &mut FormSession<'_, P>,
    answers: &AnswerBank,
) -> Result<(), Halt> {
    let ctx = session.ctx;
    let blocks = session.question_blocks(fields::QUESTION_BLOCK).await?;
    let market = ctx.market();
    let mut needs_review = Vec::new();

    for block in blocks {
        let key = format!("question:{}", block.input_selector);
        if session.is_done(&key) {
            continue;
        }
        let reply = answers.answer_screening_question(&block.label, Some(market));
        if reply.pause {
            if block.required {
                needs_review.push(block.label);
            } else {
                session
                    .builder
                    .error(format!("optional question left blank: {}", block.label));
                session.mark_done(key);
            }
            continue;
        }

        session.fill_selector(&block.input_selector, &reply.answer).await?;
        session
            .builder
            .field_filled(format!("question:{}", truncate_text(&block.label, 40)));
        session.mark_done(key);
    }

    if needs_review.is_empty() {
        Ok(())
    } else {
        Err(Halt::NeedsReview(needs_review))
    }
}

async fn capture_halt_screenshot<P: FormPage + ?Sized>(session: &mut FormSession<'_, P>) {
    let ctx = session.ctx;
    let Some(dir) = ctx.settings.logs_dir.as_deref() else {
        return;
    };
    if std::fs::create_dir_all(dir).is_err() {
        return;
    }

    let context = format!("{}_halt", ctx.application_id());
    let path = dir.join(screenshot_file_name(&context, ctx.platform.id()));
    let shot = session
        .guarded("screenshot", session.page.screenshot(&path))
        .await;
    match shot {
        Ok(()) => {
            session.builder.screenshot(path_string(&path));
        }
        Err(e) => warn!("{} 中止截图失败: {}", ctx, e),
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}
