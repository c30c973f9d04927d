//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 安装全局日志订阅者
///
/// 设置了 `RUST_LOG` 时以它为准，否则按 `verbose` 选择 debug / info。
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,quiz_question_gen={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
