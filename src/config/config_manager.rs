// ==========================================
// 售后维修管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value,全局作用域)
// ==========================================

use crate::engine::reconciler::UnderflowPolicy;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键全集
// ==========================================
pub mod config_keys {
    /// 新建备件的默认低库存阈值
    pub const DEFAULT_LOW_STOCK_THRESHOLD: &str = "parts/default_low_stock_threshold";
    /// 库存下溢策略: "clamp_and_warn" | "reject"
    pub const UNDERFLOW_POLICY: &str = "parts/underflow_policy";
}

/// 新建备件默认低库存阈值的出厂值
pub const FACTORY_LOW_STOCK_THRESHOLD: i64 = 5;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA(幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值(存在则覆盖)
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 新建备件的默认低库存阈值
    pub fn default_low_stock_threshold(&self) -> Result<i64, Box<dyn Error>> {
        match self.get_config_value(config_keys::DEFAULT_LOW_STOCK_THRESHOLD)? {
            Some(raw) => Ok(raw.parse::<i64>()?),
            None => Ok(FACTORY_LOW_STOCK_THRESHOLD),
        }
    }

    /// 库存下溢策略(未配置时默认截断并告警)
    pub fn underflow_policy(&self) -> Result<UnderflowPolicy, Box<dyn Error>> {
        match self.get_config_value(config_keys::UNDERFLOW_POLICY)? {
            Some(raw) => match raw.as_str() {
                "clamp_and_warn" => Ok(UnderflowPolicy::ClampAndWarn),
                "reject" => Ok(UnderflowPolicy::Reject),
                other => Err(format!("未知下溢策略配置: {}", other).into()),
            },
            None => Ok(UnderflowPolicy::ClampAndWarn),
        }
    }
}
