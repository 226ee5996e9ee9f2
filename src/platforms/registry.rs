//! Runner 集合
//!
//! 启动时从平台配置目录加载一次，运行期间只读

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{AppResult, FileError, PlatformConfigError};
use crate::services::ApplyVerifier;

use super::{Platform, PlatformConfig, PlatformRunner};

/// 所有已加载平台的 Runner
#[derive(Debug, Clone)]
pub struct RunnerSet {
    runners: Vec<PlatformRunner>,
    verifier: Arc<ApplyVerifier>,
}

impl RunnerSet {
    /// 从目录加载 `<platform>.toml`，缺失的平台跳过
    pub fn load(dir: &Path, inspect_timeout: Duration) -> AppResult<Self> {
        if !dir.is_dir() {
            return Err(FileError::DirectoryNotFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        let mut configs = Vec::new();
        for platform in Platform::ALL {
            let path = dir.join(platform.config_file_name());
            if !path.exists() {
                warn!("⚠️ 未找到平台配置 {}，跳过 {}", path.display(), platform);
                continue;
            }
            let config = PlatformConfig::load(&path, platform)?;
            info!(
                "✓ 已加载平台 {} (配置版本 {}, {} 个字段)",
                platform,
                config.version,
                config.selectors.len()
            );
            configs.push((platform, config));
        }

        Ok(Self::from_configs(configs, inspect_timeout)?)
    }

    /// 用已解析的配置构建，所有 Runner 共享同一个校验器
    pub fn from_configs(
        configs: Vec<(Platform, PlatformConfig)>,
        inspect_timeout: Duration,
    ) -> Result<Self, PlatformConfigError> {
        let verifier = Arc::new(ApplyVerifier::from_configs(
            configs.iter().map(|(_, config)| config),
            inspect_timeout,
        ));

        let runners = configs
            .into_iter()
            .map(|(platform, config)| PlatformRunner::new(platform, config, Arc::clone(&verifier)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { runners, verifier })
    }

    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.runners.iter().map(|r| r.platform()).collect()
    }

    pub fn verifier(&self) -> &ApplyVerifier {
        &self.verifier
    }

    /// 为 URL 选择 Runner
    ///
    /// 命中多个平台时视为无法判断，返回 None
    pub fn detect(&self, url: &str) -> Option<&PlatformRunner> {
        let mut matches = self.runners.iter().filter(|r| r.detect(url));
        let first = matches.next()?;
        if let Some(second) = matches.next() {
            warn!(
                "⚠️ URL 同时匹配 {} 和 {}，不做投递: {}",
                first.platform(),
                second.platform(),
                url
            );
            return None;
        }
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    const GREENHOUSE: &str = r##"
        version = "1"
        platform = "greenhouse"
        url_patterns = ["boards.greenhouse.io"]

        [selectors]
        first_name = ["#first_name"]
        last_name = ["#last_name"]
        email = ["#email"]
        resume_upload = ["#resume"]
        submit = ["#submit_app"]

        [confirmation_signals]
        dom_text = ["thank you for applying"]
    "##;

    const LEVER: &str = r##"
        version = "1"
        platform = "lever"
        url_patterns = ["jobs.lever.co", "acme.com/careers"]

        [selectors]
        full_name = ["input[name='name']"]
        email = ["input[name='email']"]
        resume_upload = ["#resume-upload-input"]
        submit = ["#btn-submit"]

        [confirmation_signals]
        url_patterns = ["/thanks"]
    "##;

    #[test]
    fn test_load_skips_missing_platforms() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("greenhouse.toml"), GREENHOUSE).unwrap();

        let set = RunnerSet::load(dir.path(), Duration::from_secs(5)).unwrap();
        assert_eq!(set.platforms(), vec![Platform::Greenhouse]);
        assert!(set.verifier().knows("greenhouse"));
        assert!(!set.verifier().knows("workday"));
    }

    #[test]
    fn test_load_missing_dir() {
        let err = RunnerSet::load(Path::new("/nonexistent/platforms"), Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::File(FileError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_load_invalid_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("greenhouse.toml"),
            GREENHOUSE.replace("submit = [\"#submit_app\"]", ""),
        )
        .unwrap();

        let err = RunnerSet::load(dir.path(), Duration::from_secs(5)).unwrap_err();
        assert!(err.to_string().contains("submit"));
    }

    #[test]
    fn test_detect_routes_by_url() {
        let set = RunnerSet::from_configs(
            vec![
                (Platform::Greenhouse, toml::from_str(GREENHOUSE).unwrap()),
                (Platform::Lever, toml::from_str(LEVER).unwrap()),
            ],
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            set.detect("https://boards.greenhouse.io/acme/jobs/1")
                .map(|r| r.platform()),
            Some(Platform::Greenhouse)
        );
        assert_eq!(
            set.detect("https://jobs.lever.co/acme/abc").map(|r| r.platform()),
            Some(Platform::Lever)
        );
        assert!(set.detect("https://www.linkedin.com/jobs/view/1").is_none());
    }

    #[test]
    fn test_ambiguous_url_is_not_routed() {
        let greenhouse = GREENHOUSE.replace(
            "url_patterns = [\"boards.greenhouse.io\"]",
            "url_patterns = [\"boards.greenhouse.io\", \"acme.com\"]",
        );
        let set = RunnerSet::from_configs(
            vec![
                (Platform::Greenhouse, toml::from_str(&greenhouse).unwrap()),
                (Platform::Lever, toml::from_str(LEVER).unwrap()),
            ],
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(set.detect("https://acme.com/careers/42").is_none());
    }
}
