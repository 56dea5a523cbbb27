// ==========================================
// 售后维修管理系统 - 维修工单领域模型
// ==========================================
// 职责: 维修工单实体与内嵌的备件消耗清单
// 约束: 消耗清单内嵌于工单,不做规范化拆表;
//       "工单 C 当前占用备件 P 多少" 的唯一事实来源是该工单的清单数组
// ==========================================

use crate::domain::types::CaseStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// UsageLine - 备件消耗行
// ==========================================
// part_name 是挂接时刻的名称快照,不是实时关联;
// 备件后续改名不会回写历史消耗行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLine {
    pub part_id: String,   // 备件标识
    pub part_name: String, // 名称快照(挂接时刻)
    pub quantity: i64,     // 消耗数量(> 0)
}

impl UsageLine {
    pub fn new(part_id: impl Into<String>, part_name: impl Into<String>, quantity: i64) -> Self {
        Self {
            part_id: part_id.into(),
            part_name: part_name.into(),
            quantity,
        }
    }
}

// ==========================================
// MaintenanceCase - 维修工单
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceCase {
    // ===== 主键 =====
    pub case_id: String, // 工单唯一标识

    // ===== 基础信息 =====
    pub title: String,                // 故障描述/标题
    pub customer_name: String,        // 客户名称
    pub technician_id: Option<String>, // 指派维修人员

    // ===== 状态(仅流转展示,不影响库存) =====
    pub status: CaseStatus,

    // ===== 备件消耗清单(内嵌,唯一事实来源) =====
    pub spare_parts_used: Vec<UsageLine>,

    // ===== 时间信息 =====
    pub reported_at: DateTime<Utc>,           // 报修时间
    pub resolved_at: Option<DateTime<Utc>>,   // 修复时间

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceCase {
    /// 查询当前清单中某备件的占用数量(不存在则为 0)
    pub fn quantity_for(&self, part_id: &str) -> i64 {
        quantity_for(&self.spare_parts_used, part_id)
    }
}

/// 查询消耗清单中某备件的数量(不存在则为 0)
pub fn quantity_for(usage: &[UsageLine], part_id: &str) -> i64 {
    usage
        .iter()
        .filter(|line| line.part_id == part_id)
        .map(|line| line.quantity)
        .sum()
}

/// 规范化消耗清单: 同一备件的重复行合并为一行(数量累加)
///
/// 约束: 清单内 part_id 唯一, 重复挂接同一备件表示数量累加,而非新增行。
/// 行顺序保持首次出现的顺序; part_name 取首次出现行的快照。
pub fn normalize_usage(usage: &[UsageLine]) -> Vec<UsageLine> {
    let mut merged: Vec<UsageLine> = Vec::new();
    for line in usage {
        match merged.iter_mut().find(|m| m.part_id == line.part_id) {
            Some(existing) => existing.quantity += line.quantity,
            None => merged.push(line.clone()),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_merges_duplicate_part_ids() {
        let usage = vec![
            UsageLine::new("P001", "压缩机", 2),
            UsageLine::new("P002", "冷凝器", 1),
            UsageLine::new("P001", "压缩机", 3),
        ];

        let merged = normalize_usage(&usage);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].part_id, "P001");
        assert_eq!(merged[0].quantity, 5);
        assert_eq!(merged[1].part_id, "P002");
        assert_eq!(merged[1].quantity, 1);
    }

    #[test]
    fn test_quantity_for_missing_part_is_zero() {
        let usage = vec![UsageLine::new("P001", "压缩机", 2)];
        assert_eq!(quantity_for(&usage, "P999"), 0);
        assert_eq!(quantity_for(&usage, "P001"), 2);
    }
}
