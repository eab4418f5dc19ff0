//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化日志，`RUST_LOG` 优先
pub fn init() {
    init_with_verbose(false);
}

/// 初始化日志，`verbose` 时默认级别为 debug
pub fn init_with_verbose(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试中可能被多次调用
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
