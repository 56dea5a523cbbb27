// ==========================================
// 售后维修管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和 API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{new_commit_lock, CaseApi, PartApi, TechnicianApi};
use crate::config::ConfigManager;
use crate::engine::StockReconciler;
use crate::repository::{
    SqliteCaseRepository, SqlitePartRepository, SqliteTechnicianRepository,
};

/// 应用状态
///
/// 包含所有 API 实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 备件目录 API
    pub part_api: Arc<PartApi>,

    /// 维修工单 API
    pub case_api: Arc<CaseApi>,

    /// 维修人员 API
    pub technician_api: Arc<TechnicianApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开数据库连接并初始化 schema(幂等)
    /// 2. 初始化所有 Repository(共享同一连接)
    /// 3. 按配置构建对账引擎
    /// 4. 创建所有 API 实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", db_path);

        // 创建数据库连接(共享连接)
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("无法初始化schema: {}", e))?;

        if let Ok(Some(version)) = crate::db::read_schema_version(&conn) {
            if version != crate::db::CURRENT_SCHEMA_VERSION {
                tracing::warn!(
                    "schema_version={} 与代码期望 {} 不一致",
                    version,
                    crate::db::CURRENT_SCHEMA_VERSION
                );
            }
        }

        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let part_repo = Arc::new(SqlitePartRepository::from_connection(conn.clone()));
        let case_repo = Arc::new(SqliteCaseRepository::from_connection(conn.clone()));
        let technician_repo = Arc::new(SqliteTechnicianRepository::from_connection(conn.clone()));

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let underflow_policy = config_manager
            .underflow_policy()
            .map_err(|e| format!("无法读取下溢策略配置: {}", e))?;
        let reconciler = StockReconciler::with_policy(underflow_policy);

        // ==========================================
        // 初始化API层
        // ==========================================
        // 备件目录与工单提交共用一把库存提交锁
        let commit_lock = new_commit_lock();
        let part_api = Arc::new(PartApi::new(
            part_repo.clone(),
            config_manager.clone(),
            commit_lock.clone(),
        ));
        let case_api = Arc::new(CaseApi::new(case_repo, part_repo, reconciler, commit_lock));
        let technician_api = Arc::new(TechnicianApi::new(technician_repo));

        Ok(Self {
            db_path,
            part_api,
            case_api,
            technician_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用系统应用数据目录,不可用时退回当前目录
pub fn get_default_db_path() -> String {
    let mut dir: PathBuf = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("aftersales-tracker");

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!("无法创建数据目录 {:?}: {},退回当前目录", dir, e);
        dir = PathBuf::from(".");
    }

    dir.push("aftersales.db");
    dir.to_string_lossy().to_string()
}
