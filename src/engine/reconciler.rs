// ==========================================
// 售后维修管理系统 - 库存对账引擎
// ==========================================
// 职责: 工单消耗清单从旧状态变为新状态时,计算并校验备件库存增量
// 红线: 纯计算,不做任何 IO; 校验先于一切变更(fail closed)
// 算法: 先还原后扣减 (restore-then-deduct)
//   restored  = remaining + old_qty   // 先撤销旧占用
//   remaining = restored - new_qty    // 再施加新占用
// 该公式使新增(old=0)、移除(new=0)、改量三种情形共用一条路径,
// 工单创建即退化情形 old_usage = []
// ==========================================

use crate::domain::case::{normalize_usage, quantity_for, UsageLine};
use crate::domain::part::SparePart;
use std::collections::HashMap;
use thiserror::Error;

// ==========================================
// 错误与告警类型
// ==========================================

/// 对账引擎错误
///
/// 所有错误都在任何库存变更之前返回,调用方可保证零副作用
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// 库存不足: 整个操作被拒绝,任何备件的库存字段都不发生变化
    #[error("备件库存不足: part_id={part_id}, 申请数量={requested}, 可用数量={available}")]
    InsufficientStock {
        part_id: String,
        requested: i64,
        available: i64,
    },

    /// 库存下溢(仅 UnderflowPolicy::Reject 下出现):
    /// 还原旧占用后仍不足以覆盖新占用,说明库存计数器已被管理员改偏
    #[error("备件库存下溢: part_id={part_id}, 还原后库存={restored}, 申请数量={requested}")]
    StockUnderflow {
        part_id: String,
        restored: i64,
        requested: i64,
    },

    /// 消耗数量必须为正数
    #[error("无效消耗数量: part_id={part_id}, quantity={quantity}")]
    InvalidQuantity { part_id: String, quantity: i64 },
}

/// 对账告警(不阻断操作,由调用方决定如何上报)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockWarning {
    /// 扣减结果为负,已按 0 截断
    ///
    /// 预校验通过的路径不会触发该告警;只有库存计数器已被
    /// 管理员直接编辑改偏时才可能出现
    UnderflowClamped {
        part_id: String,
        restored: i64,
        requested: i64,
    },
}

// ==========================================
// 下溢策略
// ==========================================
// 源系统对下溢静默按 0 截断;此处改为显式告警,
// 并允许通过配置切换为硬拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderflowPolicy {
    /// 按 0 截断并携带告警(默认,与源系统行为兼容)
    #[default]
    ClampAndWarn,
    /// 返回 StockUnderflow 错误,整个操作回绝
    Reject,
}

// ==========================================
// 对账结果
// ==========================================

/// 单个备件的库存调整
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub part_id: String,
    pub old_qty: i64,          // 旧清单占用数量
    pub new_qty: i64,          // 新清单占用数量
    pub remaining_before: i64, // 调整前剩余库存
    pub remaining_after: i64,  // 调整后剩余库存
}

/// 对账计划: 校验通过后待施加的全部库存调整
///
/// 调整与工单写入必须作为一个逻辑单元提交;
/// 工单写入失败时用 remaining_before 做补偿还原
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    pub adjustments: Vec<StockAdjustment>,
    pub warnings: Vec<StockWarning>,
}

impl ReconcilePlan {
    /// 无任何库存变化
    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }
}

// ==========================================
// StockReconciler - 库存对账引擎
// ==========================================
pub struct StockReconciler {
    policy: UnderflowPolicy,
}

impl StockReconciler {
    /// 构造函数(默认下溢策略: 截断并告警)
    pub fn new() -> Self {
        Self {
            policy: UnderflowPolicy::default(),
        }
    }

    /// 指定下溢策略构造
    pub fn with_policy(policy: UnderflowPolicy) -> Self {
        Self { policy }
    }

    /// 计算工单消耗清单变更对应的库存调整计划
    ///
    /// # 参数
    /// - `parts`: 备件目录快照(part_id -> SparePart),引擎不回写
    /// - `old_usage`: 当前已提交的消耗清单(创建时传空切片)
    /// - `new_usage`: 期望提交的消耗清单(删除工单时传空切片)
    ///
    /// # 返回
    /// - Ok(ReconcilePlan): 校验通过,包含全部待施加的调整
    /// - Err(ReconcileError): 校验失败,调用方不得施加任何变更
    ///
    /// # 校验规则(先于一切变更,对完整候选清单执行)
    /// - 数量必须为正(重复行已先合并,同一备件多行视为数量累加)
    /// - 增量路径: new_qty > available 时整体拒绝,
    ///   available = remaining + old_qty(目录缺失该备件时按 old_qty,即 remaining 视为 0)
    /// - 非增量路径(new_qty <= old_qty)不做可用量校验:
    ///   纯归还不得被缺失或改偏的目录记录阻断
    pub fn plan(
        &self,
        parts: &HashMap<String, SparePart>,
        old_usage: &[UsageLine],
        new_usage: &[UsageLine],
    ) -> Result<ReconcilePlan, ReconcileError> {
        let old_usage = normalize_usage(old_usage);
        let new_usage = normalize_usage(new_usage);

        for line in &new_usage {
            if line.quantity <= 0 {
                return Err(ReconcileError::InvalidQuantity {
                    part_id: line.part_id.clone(),
                    quantity: line.quantity,
                });
            }
        }

        // 受影响备件集合: 旧清单顺序在前,新清单新增的在后
        let mut part_ids: Vec<String> = old_usage.iter().map(|l| l.part_id.clone()).collect();
        for line in &new_usage {
            if !part_ids.contains(&line.part_id) {
                part_ids.push(line.part_id.clone());
            }
        }

        // ===== 第一遍: 全量校验,零副作用 =====
        for part_id in &part_ids {
            let old_qty = quantity_for(&old_usage, part_id);
            let new_qty = quantity_for(&new_usage, part_id);
            if new_qty <= old_qty {
                continue;
            }

            // 目录缺失的备件按 remaining = 0 降级,禁止任何增量
            let available = match parts.get(part_id) {
                Some(part) => part.remaining_stock + old_qty,
                None => old_qty,
            };
            if new_qty > available {
                return Err(ReconcileError::InsufficientStock {
                    part_id: part_id.clone(),
                    requested: new_qty,
                    available,
                });
            }
        }

        // ===== 第二遍: 计算调整(先还原后扣减) =====
        let mut plan = ReconcilePlan::default();
        for part_id in &part_ids {
            let old_qty = quantity_for(&old_usage, part_id);
            let new_qty = quantity_for(&new_usage, part_id);
            if new_qty == old_qty {
                continue;
            }

            // 目录中已不存在的备件无处可写,跳过(纯归还仍视为成功)
            let part = match parts.get(part_id) {
                Some(p) => p,
                None => continue,
            };

            let restored = part.remaining_stock + old_qty;
            let raw_after = restored - new_qty;
            let remaining_after = if raw_after < 0 {
                match self.policy {
                    UnderflowPolicy::Reject => {
                        return Err(ReconcileError::StockUnderflow {
                            part_id: part_id.clone(),
                            restored,
                            requested: new_qty,
                        });
                    }
                    UnderflowPolicy::ClampAndWarn => {
                        plan.warnings.push(StockWarning::UnderflowClamped {
                            part_id: part_id.clone(),
                            restored,
                            requested: new_qty,
                        });
                        0
                    }
                }
            } else {
                raw_after
            };

            plan.adjustments.push(StockAdjustment {
                part_id: part_id.clone(),
                old_qty,
                new_qty,
                remaining_before: part.remaining_stock,
                remaining_after,
            });
        }

        Ok(plan)
    }
}

impl Default for StockReconciler {
    fn default() -> Self {
        Self::new()
    }
}
