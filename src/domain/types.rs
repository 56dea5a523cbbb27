// ==========================================
// 售后维修管理系统 - 领域类型定义
// ==========================================
// 职责: 展示分类与工单状态的枚举类型
// 约束: 枚举仅用于展示/流转分类,不参与库存运算
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 库存健康度 (Stock Health)
// ==========================================
// 仅用于前端展示分类,对库存扣减无任何行为影响
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockHealth {
    Out,    // 缺货 (remaining <= 0)
    Low,    // 低库存 (remaining <= threshold)
    Normal, // 正常
}

impl fmt::Display for StockHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockHealth::Out => write!(f, "OUT"),
            StockHealth::Low => write!(f, "LOW"),
            StockHealth::Normal => write!(f, "NORMAL"),
        }
    }
}

impl std::str::FromStr for StockHealth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OUT" => Ok(StockHealth::Out),
            "LOW" => Ok(StockHealth::Low),
            "NORMAL" => Ok(StockHealth::Normal),
            _ => Err(format!("未知库存健康度: {}", s)),
        }
    }
}

// ==========================================
// 工单状态 (Case Status)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// 约束: 状态流转不影响库存,库存只跟随工单内嵌的备件消耗清单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    #[default]
    Open,       // 已登记
    InProgress, // 维修中
    Resolved,   // 已修复
    Closed,     // 已关闭
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseStatus::Open => write!(f, "OPEN"),
            CaseStatus::InProgress => write!(f, "IN_PROGRESS"),
            CaseStatus::Resolved => write!(f, "RESOLVED"),
            CaseStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(CaseStatus::Open),
            "IN_PROGRESS" => Ok(CaseStatus::InProgress),
            "RESOLVED" => Ok(CaseStatus::Resolved),
            "CLOSED" => Ok(CaseStatus::Closed),
            _ => Err(format!("未知工单状态: {}", s)),
        }
    }
}
