// ==========================================
// 售后维修管理系统 - 维修人员仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::technician::Technician;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// TechnicianRepository - 维修人员仓储接口
// ==========================================
pub trait TechnicianRepository: Send + Sync {
    fn find_all(&self) -> RepositoryResult<Vec<Technician>>;
    fn find_by_id(&self, technician_id: &str) -> RepositoryResult<Option<Technician>>;
    fn insert(&self, technician: &Technician) -> RepositoryResult<()>;
    fn update(&self, technician: &Technician) -> RepositoryResult<()>;
    fn replace_all(&self, technicians: &[Technician]) -> RepositoryResult<()>;
    fn delete(&self, technician_id: &str) -> RepositoryResult<()>;
}

// ==========================================
// SqliteTechnicianRepository - SQLite 实现
// ==========================================

/// 维修人员仓储(SQLite)
pub struct SqliteTechnicianRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTechnicianRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Technician> {
        Ok(Technician {
            technician_id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            active: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl TechnicianRepository for SqliteTechnicianRepository {
    fn find_all(&self) -> RepositoryResult<Vec<Technician>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT technician_id, name, phone, active, created_at, updated_at
             FROM technician ORDER BY name, technician_id",
        )?;

        let technicians = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(technicians)
    }

    fn find_by_id(&self, technician_id: &str) -> RepositoryResult<Option<Technician>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT technician_id, name, phone, active, created_at, updated_at
             FROM technician WHERE technician_id = ?1",
        )?;

        let technician = stmt
            .query_row(params![technician_id], Self::map_row)
            .optional()?;
        Ok(technician)
    }

    fn insert(&self, technician: &Technician) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO technician (technician_id, name, phone, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                technician.technician_id,
                technician.name,
                technician.phone,
                technician.active,
                technician.created_at,
                technician.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update(&self, technician: &Technician) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE technician
            SET name = ?2, phone = ?3, active = ?4, updated_at = ?5
            WHERE technician_id = ?1
            "#,
            params![
                technician.technician_id,
                technician.name,
                technician.phone,
                technician.active,
                technician.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Technician".to_string(),
                id: technician.technician_id.clone(),
            });
        }
        Ok(())
    }

    fn replace_all(&self, technicians: &[Technician]) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;

        tx.execute("DELETE FROM technician", [])?;
        for technician in technicians {
            tx.execute(
                r#"
                INSERT INTO technician (technician_id, name, phone, active, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    technician.technician_id,
                    technician.name,
                    technician.phone,
                    technician.active,
                    technician.created_at,
                    technician.updated_at,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, technician_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM technician WHERE technician_id = ?1",
            params![technician_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Technician".to_string(),
                id: technician_id.to_string(),
            });
        }
        Ok(())
    }
}
