// ==========================================
// 售后维修管理系统 - 备件领域模型
// ==========================================
// 职责: 备件主数据(库存计数器、阈值)
// 约束: total_stock 只能通过补货增加; remaining_stock 由对账引擎维护
// ==========================================

use crate::domain::types::StockHealth;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// SparePart - 备件主数据
// ==========================================
// 预期不变量: 0 <= remaining_stock <= total_stock
// 注意: 管理员直接编辑可以绕过该不变量(见 PartApi::edit_part),
//       因此读取方不得假设它恒成立
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparePart {
    // ===== 主键 =====
    pub part_id: String, // 备件唯一标识

    // ===== 基础信息 =====
    pub name: String, // 备件名称
    pub unit: String, // 计量单位(个/套/米...)

    // ===== 库存计数器 =====
    pub total_stock: i64,     // 总库存(只经补货增加)
    pub remaining_stock: i64, // 剩余库存(对账引擎扣减/返还)

    // ===== 展示阈值 =====
    pub low_stock_threshold: i64, // 低库存阈值(仅用于展示分类)

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>, // 记录创建时间
    pub updated_at: DateTime<Utc>, // 记录更新时间
}

impl SparePart {
    /// 库存健康度分类(仅展示用途,无行为影响)
    pub fn stock_health(&self) -> StockHealth {
        if self.remaining_stock <= 0 {
            StockHealth::Out
        } else if self.remaining_stock <= self.low_stock_threshold {
            StockHealth::Low
        } else {
            StockHealth::Normal
        }
    }

    /// 已消耗数量(总库存 - 剩余库存)
    ///
    /// 守恒性质: 该值应等于所有已提交工单中该备件消耗数量之和
    pub fn consumed(&self) -> i64 {
        self.total_stock - self.remaining_stock
    }
}
