// ==========================================
// 售后维修管理系统 - 日志系统
// ==========================================
// 职责: 初始化 tracing 订阅器
// 约定: 库存下溢截断与管理员越界编辑记 warn,
//       提交/补偿链路的关键节点记 debug
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

// RUST_LOG 优先,未设置时回落到给定指令
fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// 初始化日志系统(二进制入口调用)
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器(默认: info)
///   例如: RUST_LOG=debug 或 RUST_LOG=aftersales_tracker=trace
pub fn init() {
    fmt()
        .with_env_filter(env_filter("info"))
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 初始化测试环境的日志系统
///
/// 默认放开本 crate 的 debug 日志,输出走测试捕获器;
/// 多个测试重复调用时只有第一次生效(try_init)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter("aftersales_tracker=debug"))
        .with_test_writer()
        .try_init();
}
