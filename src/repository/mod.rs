// ==========================================
// 售后维修管理系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽存储细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod case_repo;
pub mod error;
pub mod memory;
pub mod part_repo;
pub mod technician_repo;

// 重导出核心仓储
pub use case_repo::{CaseRepository, SqliteCaseRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use memory::{InMemoryCaseRepository, InMemoryPartRepository, InMemoryTechnicianRepository};
pub use part_repo::{PartRepository, SqlitePartRepository};
pub use technician_repo::{SqliteTechnicianRepository, TechnicianRepository};
