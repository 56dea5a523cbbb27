// ==========================================
// 售后维修管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供上层表单/命令调用
// ==========================================

use std::sync::{Arc, Mutex};

pub mod case_api;
pub mod error;
pub mod part_api;
pub mod technician_api;

// ==========================================
// 库存提交锁
// ==========================================
// 备件计数器的所有 读-改-写 序列(工单提交、补货、管理员编辑、
// 备件删除)必须共用同一把锁: 任何一条路径落在另一条路径的
// 读与写之间都会静默覆盖对方的写入,破坏守恒式
pub type StockCommitLock = Arc<Mutex<()>>;

/// 创建库存提交锁(组装 AppState 或独立构建 API 时共用一把)
pub fn new_commit_lock() -> StockCommitLock {
    Arc::new(Mutex::new(()))
}

// 重导出核心类型
pub use case_api::{CaseApi, CaseDraft};
pub use error::{ApiError, ApiResult};
pub use part_api::{NewSparePart, PartApi, PartView, StockSummary};
pub use technician_api::{NewTechnician, TechnicianApi};
