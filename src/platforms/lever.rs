//! Lever 平台步骤
//!
//! Lever 只有一个姓名输入框（full_name），欧洲职位页底部带数据处理同意框

use crate::infrastructure::FormPage;
use crate::workflow::{FormSession, Halt};

use super::config::fields;

/// 数据处理同意框（GDPR）
pub async fn accept_data_consent<P: FormPage + ?Sized>(
    session: &mut FormSession<'_, P>,
) -> Result<bool, Halt> {
    session.check_optional(fields::DATA_CONSENT).await
}
