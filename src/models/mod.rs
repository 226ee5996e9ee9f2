pub mod application;
pub mod attempt;
pub mod decision;
pub mod loaders;
pub mod personal_info;
pub mod verification;

pub use application::{ApplicationTask, ResumeContent, ResumeFormat};
pub use attempt::{AttemptResult, AttemptResultBuilder, AttemptStatus};
pub use decision::{MonitorDecision, RateLimitConfig};
pub use loaders::{archive_task_file, load_application_queue, load_application_task, read_toml};
pub use personal_info::{PersonalInfo, PersonalInfoDraft, PersonalInfoError};
pub use verification::{Confidence, VerificationResult};
