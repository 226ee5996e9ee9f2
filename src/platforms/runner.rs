//! 平台 Runner
//!
//! 每个平台一个变体，通用流程在 `workflow::apply_flow`，
//! 这里只负责把平台特有的步骤分派到对应模块

use std::sync::Arc;

use crate::error::PlatformConfigError;
use crate::infrastructure::FormPage;
use crate::models::{AttemptResult, ResumeContent};
use crate::services::{AnswerBank, ApplyVerifier};
use crate::workflow::{apply_flow, ApplyCtx, FormSession, Halt};

use super::{greenhouse, lever, workday, Platform, PlatformConfig};

/// 单个平台的投递执行器
#[derive(Debug, Clone)]
pub struct PlatformRunner {
    platform: Platform,
    config: PlatformConfig,
    verifier: Arc<ApplyVerifier>,
}

impl PlatformRunner {
    /// 创建 Runner，配置会再校验一次
    pub fn new(
        platform: Platform,
        config: PlatformConfig,
        verifier: Arc<ApplyVerifier>,
    ) -> Result<Self, PlatformConfigError> {
        config.validate(platform)?;
        Ok(Self {
            platform,
            config,
            verifier,
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn verifier(&self) -> &ApplyVerifier {
        &self.verifier
    }

    /// URL 是否属于本平台
    pub fn detect(&self, url: &str) -> bool {
        self.config.matches_url(url)
    }

    /// 投递一条申请，所有失败都折算进返回的 `AttemptResult`
    pub async fn apply<P: FormPage + ?Sized>(
        &self,
        page: &P,
        resume: &ResumeContent,
        answers: &AnswerBank,
        ctx: &ApplyCtx<'_>,
    ) -> AttemptResult {
        apply_flow::run_apply(self, page, resume, answers, ctx).await
    }

    /// 进入申请表单前的入口步骤
    pub(crate) async fn open_application<P: FormPage + ?Sized>(
        &self,
        session: &mut FormSession<'_, P>,
    ) -> Result<(), Halt> {
        match self.platform {
            Platform::Workday => workday::open_application(session).await,
            Platform::Greenhouse | Platform::Lever => Ok(()),
        }
    }

    /// 简历上传之后、筛选问题之前的平台特有步骤
    pub(crate) async fn platform_steps<P: FormPage + ?Sized>(
        &self,
        session: &mut FormSession<'_, P>,
        resume: &ResumeContent,
    ) -> Result<(), Halt> {
        match self.platform {
            Platform::Workday => {
                workday::tick_sms_consent(session).await?;
                workday::enter_skills(session, &resume.skills).await?;
            }
            Platform::Greenhouse => {
                greenhouse::acknowledge_background_check(session).await?;
            }
            Platform::Lever => {
                lever::accept_data_consent(session).await?;
            }
        }
        Ok(())
    }

    /// 多页表单翻到下一页，返回是否翻页
    pub(crate) async fn advance_page<P: FormPage + ?Sized>(
        &self,
        session: &mut FormSession<'_, P>,
    ) -> Result<bool, Halt> {
        match self.platform {
            Platform::Workday => workday::advance_page(session).await,
            Platform::Greenhouse | Platform::Lever => Ok(false),
        }
    }
}
