// ==========================================
// 售后维修管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 售后维修工单与备件库存管理,核心是备件库存对账引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施(连接初始化/PRAGMA/建库统一)
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CaseStatus, StockHealth};

// 领域实体
pub use domain::{MaintenanceCase, SparePart, Technician, UsageLine};

// 引擎
pub use engine::{
    ReconcileError, ReconcilePlan, StockAdjustment, StockReconciler, StockWarning,
    UnderflowPolicy,
};

// API
pub use api::{new_commit_lock, ApiError, CaseApi, CaseDraft, PartApi, StockCommitLock, TechnicianApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "售后维修管理系统";
