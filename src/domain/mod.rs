// ==========================================
// 售后维修管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod case;
pub mod part;
pub mod technician;
pub mod types;

// 重导出核心类型
pub use case::{normalize_usage, quantity_for, MaintenanceCase, UsageLine};
pub use part::SparePart;
pub use technician::Technician;
pub use types::{CaseStatus, StockHealth};
