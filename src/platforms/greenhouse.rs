//! Greenhouse 平台步骤

use tracing::debug;

use crate::infrastructure::FormPage;
use crate::workflow::{FormSession, Halt};

use super::config::fields;

/// 背景调查确认框，部分公司的表单才有
pub async fn acknowledge_background_check<P: FormPage + ?Sized>(
    session: &mut FormSession<'_, P>,
) -> Result<bool, Halt> {
    let checked = session.check_optional(fields::BACKGROUND_CHECK).await?;
    if checked {
        debug!("{} 已勾选背景调查确认", session.ctx);
    }
    Ok(checked)
}
