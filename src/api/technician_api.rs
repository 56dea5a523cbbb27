// ==========================================
// 售后维修管理系统 - 维修人员 API
// ==========================================
// 职责: 维修人员主数据维护(常规 CRUD)
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::technician::Technician;
use crate::repository::technician_repo::TechnicianRepository;

/// 创建输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTechnician {
    pub technician_id: Option<String>, // 缺省时生成 uuid
    pub name: String,
    pub phone: Option<String>,
}

// ==========================================
// TechnicianApi - 维修人员 API
// ==========================================
pub struct TechnicianApi {
    technician_repo: Arc<dyn TechnicianRepository>,
}

impl TechnicianApi {
    pub fn new(technician_repo: Arc<dyn TechnicianRepository>) -> Self {
        Self { technician_repo }
    }

    /// 创建维修人员(默认在岗)
    pub fn create_technician(&self, input: NewTechnician) -> ApiResult<Technician> {
        if input.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("姓名不能为空".to_string()));
        }

        let now = Utc::now();
        let technician = Technician {
            technician_id: input
                .technician_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: input.name.trim().to_string(),
            phone: input.phone,
            active: true,
            created_at: now,
            updated_at: now,
        };

        self.technician_repo.insert(&technician)?;
        debug!(technician_id = %technician.technician_id, "维修人员已创建");
        Ok(technician)
    }

    /// 编辑维修人员(全字段覆盖)
    pub fn edit_technician(&self, mut technician: Technician) -> ApiResult<Technician> {
        if technician.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("姓名不能为空".to_string()));
        }

        technician.updated_at = Utc::now();
        self.technician_repo.update(&technician)?;
        Ok(technician)
    }

    /// 删除维修人员
    ///
    /// 不级联工单: 历史工单保留 technician_id 引用
    pub fn delete_technician(&self, technician_id: &str) -> ApiResult<()> {
        self.technician_repo.delete(technician_id)?;
        Ok(())
    }

    /// 按主键查询
    pub fn get_technician(&self, technician_id: &str) -> ApiResult<Option<Technician>> {
        Ok(self.technician_repo.find_by_id(technician_id)?)
    }

    /// 查询列表(可选仅在岗)
    pub fn list_technicians(&self, active_only: bool) -> ApiResult<Vec<Technician>> {
        let technicians = self.technician_repo.find_all()?;
        Ok(if active_only {
            technicians.into_iter().filter(|t| t.active).collect()
        } else {
            technicians
        })
    }
}
