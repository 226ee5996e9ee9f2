use anyhow::Result;
use ats_autoapply::utils::logging;
use ats_autoapply::{App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化应用
    let mut app = App::initialize(config).await?;

    // Ctrl+C 只在两条申请之间生效，不打断正在填写的表单
    let shutdown_token = app.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到停止信号，当前申请完成后停止");
            shutdown_token.cancel();
        }
    });

    app.run().await?;

    Ok(())
}
