// ==========================================
// 售后维修管理系统 - 维修人员领域模型
// ==========================================
// 职责: 维修人员主数据(常规 CRUD 实体)
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 维修人员主数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technician {
    pub technician_id: String, // 人员唯一标识
    pub name: String,          // 姓名
    pub phone: Option<String>, // 联系电话
    pub active: bool,          // 是否在岗(离岗人员保留记录,不可指派)

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
