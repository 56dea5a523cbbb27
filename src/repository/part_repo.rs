// ==========================================
// 售后维修管理系统 - 备件仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::domain::part::SparePart;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PartRepository - 备件仓储接口
// ==========================================
// 持久化网关契约: get / set / add / update(含部分字段) / delete
// 实现: SqlitePartRepository(本地库) / InMemoryPartRepository(内存库)
pub trait PartRepository: Send + Sync {
    /// 读取全部备件
    fn find_all(&self) -> RepositoryResult<Vec<SparePart>>;

    /// 按主键读取单个备件
    fn find_by_id(&self, part_id: &str) -> RepositoryResult<Option<SparePart>>;

    /// 新增备件(主键冲突返回 UniqueConstraintViolation)
    fn insert(&self, part: &SparePart) -> RepositoryResult<()>;

    /// 全字段覆盖更新(目标不存在返回 NotFound)
    fn update(&self, part: &SparePart) -> RepositoryResult<()>;

    /// 部分字段更新: 仅写入剩余库存(对账引擎/补偿还原专用)
    ///
    /// 目标不存在返回 NotFound
    fn update_stock(&self, part_id: &str, remaining_stock: i64) -> RepositoryResult<()>;

    /// 整集合覆盖写入
    fn replace_all(&self, parts: &[SparePart]) -> RepositoryResult<()>;

    /// 删除备件(目标不存在返回 NotFound)
    fn delete(&self, part_id: &str) -> RepositoryResult<()>;
}

// ==========================================
// SqlitePartRepository - SQLite 实现
// ==========================================

/// 备件仓储(SQLite)
/// 职责: 管理 spare_part 表的 CRUD 操作
pub struct SqlitePartRepository {
    conn: Arc<Mutex<Connection>>,
}

const PART_COLUMNS: &str = "part_id, name, unit, total_stock, remaining_stock, \
                            low_stock_threshold, created_at, updated_at";

impl SqlitePartRepository {
    /// 创建新的备件仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<SparePart> {
        Ok(SparePart {
            part_id: row.get(0)?,
            name: row.get(1)?,
            unit: row.get(2)?,
            total_stock: row.get(3)?,
            remaining_stock: row.get(4)?,
            low_stock_threshold: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl PartRepository for SqlitePartRepository {
    fn find_all(&self) -> RepositoryResult<Vec<SparePart>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM spare_part ORDER BY name, part_id",
            PART_COLUMNS
        ))?;

        let parts = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(parts)
    }

    fn find_by_id(&self, part_id: &str) -> RepositoryResult<Option<SparePart>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM spare_part WHERE part_id = ?1",
            PART_COLUMNS
        ))?;

        let part = stmt.query_row(params![part_id], Self::map_row).optional()?;
        Ok(part)
    }

    fn insert(&self, part: &SparePart) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO spare_part (
                part_id, name, unit, total_stock, remaining_stock,
                low_stock_threshold, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                part.part_id,
                part.name,
                part.unit,
                part.total_stock,
                part.remaining_stock,
                part.low_stock_threshold,
                part.created_at,
                part.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update(&self, part: &SparePart) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE spare_part
            SET name = ?2, unit = ?3, total_stock = ?4, remaining_stock = ?5,
                low_stock_threshold = ?6, updated_at = ?7
            WHERE part_id = ?1
            "#,
            params![
                part.part_id,
                part.name,
                part.unit,
                part.total_stock,
                part.remaining_stock,
                part.low_stock_threshold,
                part.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SparePart".to_string(),
                id: part.part_id.clone(),
            });
        }
        Ok(())
    }

    fn update_stock(&self, part_id: &str, remaining_stock: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE spare_part SET remaining_stock = ?2, updated_at = ?3 WHERE part_id = ?1",
            params![part_id, remaining_stock, Utc::now()],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SparePart".to_string(),
                id: part_id.to_string(),
            });
        }
        Ok(())
    }

    fn replace_all(&self, parts: &[SparePart]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;

        tx.execute("DELETE FROM spare_part", [])?;
        for part in parts {
            tx.execute(
                r#"
                INSERT INTO spare_part (
                    part_id, name, unit, total_stock, remaining_stock,
                    low_stock_threshold, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    part.part_id,
                    part.name,
                    part.unit,
                    part.total_stock,
                    part.remaining_stock,
                    part.low_stock_threshold,
                    part.created_at,
                    part.updated_at,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, part_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM spare_part WHERE part_id = ?1",
            params![part_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "SparePart".to_string(),
                id: part_id.to_string(),
            });
        }
        Ok(())
    }
}
