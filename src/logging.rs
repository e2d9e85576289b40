// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 初始化全局日志; RUST_LOG 优先于配置的级别。重复调用无副作用。
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
