// ==========================================
// 售后维修管理系统 - 应用层
// ==========================================
// 职责: 组装仓储/引擎/API,供二进制入口与上层集成使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
