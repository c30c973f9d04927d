use anyhow::{Context, Result};
use quiz_question_gen::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 读取 .env（不存在时忽略）
    dotenvy::dotenv().ok();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logger::init(config.as_ref().map(|c| c.verbose_logging).unwrap_or(false));

    let config = config.context("加载配置失败")?;

    // 初始化并运行应用
    let _stats = App::initialize(config).await?.run().await?;

    Ok(())
}
