use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::BrowserError;

/// 连接到已打开的浏览器并创建一个空白页面
///
/// 投递过程只驱动这一个页面
pub async fn connect_to_browser_and_page(port: u16) -> Result<(Browser, Page), BrowserError> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let connection_failed = |e: chromiumoxide::error::CdpError| {
        error!("连接浏览器失败: {}", e);
        BrowserError::ConnectionFailed {
            port,
            source: e.to_string().into(),
        }
    };

    let (browser, mut handler) = Browser::connect(&browser_url)
        .await
        .map_err(connection_failed)?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    debug!("创建空白页面");
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(connection_failed)?;

    Ok((browser, page))
}
