//! 流程层
//!
//! 定义"一条申请"的完整投递流程，平台 Runner 在这里组合通用步骤和平台步骤

pub mod apply_ctx;
pub mod apply_flow;
pub mod form_session;
pub mod halt;

pub use apply_ctx::{ApplyCtx, ApplySettings};
pub use apply_flow::{run_apply, status_for};
pub use form_session::FormSession;
pub use halt::Halt;
