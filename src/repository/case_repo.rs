// ==========================================
// 售后维修管理系统 - 维修工单仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 备件消耗清单以 JSON 列内嵌存储(spare_parts_used),不拆表
// ==========================================

use crate::domain::case::{MaintenanceCase, UsageLine};
use crate::domain::types::CaseStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// CaseRepository - 维修工单仓储接口
// ==========================================
pub trait CaseRepository: Send + Sync {
    /// 读取全部工单
    fn find_all(&self) -> RepositoryResult<Vec<MaintenanceCase>>;

    /// 按主键读取单个工单
    fn find_by_id(&self, case_id: &str) -> RepositoryResult<Option<MaintenanceCase>>;

    /// 新增工单
    fn insert(&self, case: &MaintenanceCase) -> RepositoryResult<()>;

    /// 全字段覆盖更新(目标不存在返回 NotFound)
    fn update(&self, case: &MaintenanceCase) -> RepositoryResult<()>;

    /// 整集合覆盖写入
    fn replace_all(&self, cases: &[MaintenanceCase]) -> RepositoryResult<()>;

    /// 删除工单(目标不存在返回 NotFound)
    fn delete(&self, case_id: &str) -> RepositoryResult<()>;
}

// ==========================================
// SqliteCaseRepository - SQLite 实现
// ==========================================

/// 维修工单仓储(SQLite)
/// 职责: 管理 maintenance_case 表的 CRUD 操作
pub struct SqliteCaseRepository {
    conn: Arc<Mutex<Connection>>,
}

const CASE_COLUMNS: &str = "case_id, title, customer_name, technician_id, status, \
                            spare_parts_used, reported_at, resolved_at, created_at, updated_at";

impl SqliteCaseRepository {
    /// 创建新的工单仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<MaintenanceCase> {
        let status_raw: String = row.get(4)?;
        let status = CaseStatus::from_str(&status_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
        })?;

        let usage_raw: String = row.get(5)?;
        let usage: Vec<UsageLine> = serde_json::from_str(&usage_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(MaintenanceCase {
            case_id: row.get(0)?,
            title: row.get(1)?,
            customer_name: row.get(2)?,
            technician_id: row.get(3)?,
            status,
            spare_parts_used: usage,
            reported_at: row.get(6)?,
            resolved_at: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn usage_json(case: &MaintenanceCase) -> RepositoryResult<String> {
        Ok(serde_json::to_string(&case.spare_parts_used)?)
    }
}

impl CaseRepository for SqliteCaseRepository {
    fn find_all(&self) -> RepositoryResult<Vec<MaintenanceCase>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM maintenance_case ORDER BY reported_at DESC, case_id",
            CASE_COLUMNS
        ))?;

        let cases = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cases)
    }

    fn find_by_id(&self, case_id: &str) -> RepositoryResult<Option<MaintenanceCase>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM maintenance_case WHERE case_id = ?1",
            CASE_COLUMNS
        ))?;

        let case = stmt.query_row(params![case_id], Self::map_row).optional()?;
        Ok(case)
    }

    fn insert(&self, case: &MaintenanceCase) -> RepositoryResult<()> {
        let usage_json = Self::usage_json(case)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO maintenance_case (
                case_id, title, customer_name, technician_id, status,
                spare_parts_used, reported_at, resolved_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                case.case_id,
                case.title,
                case.customer_name,
                case.technician_id,
                case.status.to_string(),
                usage_json,
                case.reported_at,
                case.resolved_at,
                case.created_at,
                case.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update(&self, case: &MaintenanceCase) -> RepositoryResult<()> {
        let usage_json = Self::usage_json(case)?;
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE maintenance_case
            SET title = ?2, customer_name = ?3, technician_id = ?4, status = ?5,
                spare_parts_used = ?6, reported_at = ?7, resolved_at = ?8, updated_at = ?9
            WHERE case_id = ?1
            "#,
            params![
                case.case_id,
                case.title,
                case.customer_name,
                case.technician_id,
                case.status.to_string(),
                usage_json,
                case.reported_at,
                case.resolved_at,
                case.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MaintenanceCase".to_string(),
                id: case.case_id.clone(),
            });
        }
        Ok(())
    }

    fn replace_all(&self, cases: &[MaintenanceCase]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;

        tx.execute("DELETE FROM maintenance_case", [])?;
        for case in cases {
            let usage_json = serde_json::to_string(&case.spare_parts_used)?;
            tx.execute(
                r#"
                INSERT INTO maintenance_case (
                    case_id, title, customer_name, technician_id, status,
                    spare_parts_used, reported_at, resolved_at, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    case.case_id,
                    case.title,
                    case.customer_name,
                    case.technician_id,
                    case.status.to_string(),
                    usage_json,
                    case.reported_at,
                    case.resolved_at,
                    case.created_at,
                    case.updated_at,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, case_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM maintenance_case WHERE case_id = ?1",
            params![case_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "MaintenanceCase".to_string(),
                id: case_id.to_string(),
            });
        }
        Ok(())
    }
}
