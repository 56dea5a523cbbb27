// ==========================================
// 售后维修管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换仓储/引擎错误为用户友好的错误消息
// 约束: 所有校验类错误在任何写入之前返回(fail closed),
//       持久化错误原样上抛,重试策略由调用方负责
// ==========================================

use crate::engine::reconciler::ReconcileError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 库存对账错误(用户可自行纠正)
    // ==========================================
    /// 库存不足: 操作整体回绝,零副作用
    #[error("备件库存不足: part_id={part_id}, 申请数量={requested}, 可用数量={available}")]
    InsufficientStock {
        part_id: String,
        requested: i64,
        available: i64,
    },

    /// 库存下溢(仅在下溢策略配置为 reject 时出现)
    #[error("备件库存下溢: part_id={part_id}, 还原后库存={restored}, 申请数量={requested}")]
    StockUnderflow {
        part_id: String,
        restored: i64,
        requested: i64,
    },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

// ==========================================
// 从 ReconcileError 转换
// 引擎错误全部发生在任何写入之前
// ==========================================
impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::InsufficientStock {
                part_id,
                requested,
                available,
            } => ApiError::InsufficientStock {
                part_id,
                requested,
                available,
            },
            ReconcileError::StockUnderflow {
                part_id,
                restored,
                requested,
            } => ApiError::StockUnderflow {
                part_id,
                restored,
                requested,
            },
            ReconcileError::InvalidQuantity { part_id, quantity } => ApiError::InvalidInput(
                format!("消耗数量必须为正数: part_id={}, quantity={}", part_id, quantity),
            ),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
