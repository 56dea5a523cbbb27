// ==========================================
// 售后维修管理系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎
// 红线: Engine 不拼 SQL,不做 IO; 校验先于一切变更
// ==========================================

pub mod reconciler;

// 重导出核心引擎
pub use reconciler::{
    ReconcileError, ReconcilePlan, StockAdjustment, StockReconciler, StockWarning,
    UnderflowPolicy,
};
