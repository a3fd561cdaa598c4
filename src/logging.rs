// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式环境变量（json → 结构化输出,其余为文本）
pub const LOG_FORMAT_ENV: &str = "HARVEST_SETTLEMENT_LOG_FORMAT";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=harvest_settlement=trace
///
/// # 示例
/// ```no_run
/// use harvest_settlement::logging;
/// logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(env_filter("info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化 JSON 格式日志（用于日志采集）
pub fn init_json() {
    fmt()
        .json()
        .with_env_filter(env_filter("info"))
        .with_target(true)
        .with_current_span(false)
        .init();
}

/// 按 HARVEST_SETTLEMENT_LOG_FORMAT 选择文本或 JSON 输出
pub fn init_from_env() {
    match std::env::var(LOG_FORMAT_ENV) {
        Ok(format) if wants_json(&format) => init_json(),
        _ => init(),
    }
}

fn wants_json(format: &str) -> bool {
    format.trim().eq_ignore_ascii_case("json")
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试；重复调用安全
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
