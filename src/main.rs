// ==========================================
// 售后维修管理系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 职责: 初始化日志与存储,组装 AppState,输出启动摘要
// ==========================================

use aftersales_tracker::app::{get_default_db_path, AppState};

fn main() {
    // 初始化日志系统
    aftersales_tracker::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", aftersales_tracker::APP_NAME);
    tracing::info!("系统版本: {}", aftersales_tracker::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径(可用环境变量覆盖)
    let db_path =
        std::env::var("AFTERSALES_DB_PATH").unwrap_or_else(|_| get_default_db_path());
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            std::process::exit(1);
        }
    };

    // 启动摘要: 库存健康度
    match app_state.part_api.stock_summary() {
        Ok(summary) => tracing::info!(
            "备件库存概况: 共{}种, 正常{}, 低库存{}, 缺货{}",
            summary.total,
            summary.normal,
            summary.low,
            summary.out
        ),
        Err(e) => tracing::warn!("无法读取库存概况: {}", e),
    }

    tracing::info!("初始化完成");
}
