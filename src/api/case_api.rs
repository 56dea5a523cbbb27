// ==========================================
// 售后维修管理系统 - 维修工单 API
// ==========================================
// 职责: 工单生命周期编排(创建/更新/删除),在正确时机调用库存对账引擎
// 状态机: Staged(表单暂存) -> Committed(创建或任一次更新后) -> Deleted(终态)
// 红线: 目录写入与工单写入视为一个逻辑单元:
//       先全量校验并计算库存增量,再写目录,再写工单;
//       工单写入失败时对目录做补偿还原,绝不让两者停在不一致状态
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::StockCommitLock;
use crate::domain::case::{normalize_usage, MaintenanceCase, UsageLine};
use crate::domain::part::SparePart;
use crate::domain::types::CaseStatus;
use crate::engine::reconciler::{ReconcilePlan, StockAdjustment, StockReconciler, StockWarning};
use crate::repository::case_repo::CaseRepository;
use crate::repository::part_repo::PartRepository;

// ==========================================
// CaseDraft - 工单表单数据(不含消耗清单)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseDraft {
    pub title: String,
    pub customer_name: String,
    pub technician_id: Option<String>,
    pub status: CaseStatus,
    pub reported_at: Option<DateTime<Utc>>, // 缺省取当前时间
    pub resolved_at: Option<DateTime<Utc>>,
}

// ==========================================
// CaseApi - 工单生命周期控制器
// ==========================================
pub struct CaseApi {
    case_repo: Arc<dyn CaseRepository>,
    part_repo: Arc<dyn PartRepository>,
    reconciler: StockReconciler,

    // 提交锁: 校验-读库存-写库存是经典的丢失更新温床,
    // 两个并发提交同时读到 remaining=10 会互相覆盖而不是叠加。
    // 整个 对账+持久化 序列在该锁内执行。
    // 该锁与 PartApi 共用: 补货/管理员编辑落在提交的读与写之间
    // 同样会被静默覆盖,必须一并串行化。
    commit_lock: StockCommitLock,
}

impl CaseApi {
    /// 创建新的 CaseApi 实例
    ///
    /// commit_lock 必须与操作同一目录的 PartApi 共用一把
    pub fn new(
        case_repo: Arc<dyn CaseRepository>,
        part_repo: Arc<dyn PartRepository>,
        reconciler: StockReconciler,
        commit_lock: StockCommitLock,
    ) -> Self {
        Self {
            case_repo,
            part_repo,
            reconciler,
            commit_lock,
        }
    }

    // ==========================================
    // 生命周期接口
    // ==========================================

    /// 创建工单: 对账(old=[], new=usage),成功后持久化工单
    pub fn create_case(
        &self,
        draft: CaseDraft,
        usage: &[UsageLine],
    ) -> ApiResult<MaintenanceCase> {
        validate_draft(&draft)?;
        let _guard = self.lock_commits()?;

        let usage = self.snapshot_part_names(normalize_usage(usage))?;
        let parts = self.load_catalog_slice(&[], &usage)?;
        let plan = self.reconciler.plan(&parts, &[], &usage)?;

        let now = Utc::now();
        let case = MaintenanceCase {
            case_id: Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            customer_name: draft.customer_name.trim().to_string(),
            technician_id: draft.technician_id,
            status: draft.status,
            spare_parts_used: usage,
            reported_at: draft.reported_at.unwrap_or(now),
            resolved_at: draft.resolved_at,
            created_at: now,
            updated_at: now,
        };

        self.commit(&plan, || self.case_repo.insert(&case))?;
        debug!(case_id = %case.case_id, lines = case.spare_parts_used.len(), "工单已创建");
        Ok(case)
    }

    /// 更新工单: 对账(old=已提交清单, new=usage),成功后持久化
    pub fn update_case(
        &self,
        case_id: &str,
        draft: CaseDraft,
        usage: &[UsageLine],
    ) -> ApiResult<MaintenanceCase> {
        validate_draft(&draft)?;
        let _guard = self.lock_commits()?;

        let committed = self
            .case_repo
            .find_by_id(case_id)?
            .ok_or_else(|| ApiError::NotFound(format!("MaintenanceCase(id={})不存在", case_id)))?;

        let usage = self.snapshot_part_names(normalize_usage(usage))?;
        let parts = self.load_catalog_slice(&committed.spare_parts_used, &usage)?;
        let plan = self
            .reconciler
            .plan(&parts, &committed.spare_parts_used, &usage)?;

        let case = MaintenanceCase {
            case_id: committed.case_id.clone(),
            title: draft.title.trim().to_string(),
            customer_name: draft.customer_name.trim().to_string(),
            technician_id: draft.technician_id,
            status: draft.status,
            spare_parts_used: usage,
            reported_at: draft.reported_at.unwrap_or(committed.reported_at),
            resolved_at: draft.resolved_at,
            created_at: committed.created_at,
            updated_at: Utc::now(),
        };

        self.commit(&plan, || self.case_repo.update(&case))?;
        debug!(case_id = %case.case_id, "工单已更新");
        Ok(case)
    }

    /// 删除工单(终态): 对账(old=已提交清单, new=[]),成功后移除记录
    ///
    /// 纯归还路径: 即使清单引用的备件已从目录删除也不会被阻断
    pub fn delete_case(&self, case_id: &str) -> ApiResult<()> {
        let _guard = self.lock_commits()?;

        let committed = self
            .case_repo
            .find_by_id(case_id)?
            .ok_or_else(|| ApiError::NotFound(format!("MaintenanceCase(id={})不存在", case_id)))?;

        let parts = self.load_catalog_slice(&committed.spare_parts_used, &[])?;
        let plan = self
            .reconciler
            .plan(&parts, &committed.spare_parts_used, &[])?;

        self.commit(&plan, || self.case_repo.delete(case_id))?;
        debug!(case_id = %case_id, "工单已删除,占用库存已返还");
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按主键查询工单
    pub fn get_case(&self, case_id: &str) -> ApiResult<Option<MaintenanceCase>> {
        Ok(self.case_repo.find_by_id(case_id)?)
    }

    /// 查询工单列表(可按状态过滤)
    pub fn list_cases(&self, status: Option<CaseStatus>) -> ApiResult<Vec<MaintenanceCase>> {
        let cases = self.case_repo.find_all()?;
        Ok(match status {
            Some(s) => cases.into_iter().filter(|c| c.status == s).collect(),
            None => cases,
        })
    }

    /// 统计某备件在全部已提交工单中的占用总量
    ///
    /// 守恒性质: total_stock - remaining_stock 应等于该值
    pub fn committed_usage_total(&self, part_id: &str) -> ApiResult<i64> {
        let cases = self.case_repo.find_all()?;
        Ok(cases.iter().map(|c| c.quantity_for(part_id)).sum())
    }

    // ==========================================
    // 内部: 提交序列
    // ==========================================

    fn lock_commits(&self) -> ApiResult<std::sync::MutexGuard<'_, ()>> {
        self.commit_lock
            .lock()
            .map_err(|e| ApiError::InternalError(format!("提交锁获取失败: {}", e)))
    }

    /// 加载新旧清单涉及的目录切片(缺失的备件不报错,由引擎降级处理)
    fn load_catalog_slice(
        &self,
        old_usage: &[UsageLine],
        new_usage: &[UsageLine],
    ) -> ApiResult<HashMap<String, SparePart>> {
        let mut parts = HashMap::new();
        for line in old_usage.iter().chain(new_usage.iter()) {
            if parts.contains_key(&line.part_id) {
                continue;
            }
            if let Some(part) = self.part_repo.find_by_id(&line.part_id)? {
                parts.insert(line.part_id.clone(), part);
            }
        }
        Ok(parts)
    }

    /// 为名称快照为空的消耗行补齐挂接时刻的备件名称
    ///
    /// 快照不是实时关联: 此后备件改名不会回写清单
    fn snapshot_part_names(&self, mut usage: Vec<UsageLine>) -> ApiResult<Vec<UsageLine>> {
        for line in &mut usage {
            if line.part_name.trim().is_empty() {
                if let Some(part) = self.part_repo.find_by_id(&line.part_id)? {
                    line.part_name = part.name;
                }
            }
        }
        Ok(usage)
    }

    /// 提交序列: 写目录 -> 写工单,任一步失败都把目录还原到提交前
    fn commit<F>(&self, plan: &ReconcilePlan, write_case: F) -> ApiResult<()>
    where
        F: FnOnce() -> crate::repository::error::RepositoryResult<()>,
    {
        for warning in &plan.warnings {
            match warning {
                StockWarning::UnderflowClamped {
                    part_id,
                    restored,
                    requested,
                } => warn!(
                    part_id = %part_id,
                    restored,
                    requested,
                    "库存扣减出现下溢,已按 0 截断(库存计数器可能已被直接编辑改偏)"
                ),
            }
        }

        // 写目录: 中途失败还原已写入的部分
        let mut applied: Vec<&StockAdjustment> = Vec::new();
        for adjustment in &plan.adjustments {
            match self
                .part_repo
                .update_stock(&adjustment.part_id, adjustment.remaining_after)
            {
                Ok(()) => applied.push(adjustment),
                Err(e) => {
                    self.rollback(&applied);
                    return Err(e.into());
                }
            }
        }

        // 写工单: 失败则对目录做补偿还原
        if let Err(e) = write_case() {
            self.rollback(&applied);
            return Err(e.into());
        }
        Ok(())
    }

    /// 补偿还原: 把已施加的调整写回 remaining_before
    ///
    /// 还原本身失败只能记录错误日志: 网关不提供跨集合事务,
    /// 此时系统处于已定义的不一致状态,需人工对账
    fn rollback(&self, applied: &[&StockAdjustment]) {
        for adjustment in applied.iter().rev() {
            if let Err(e) = self
                .part_repo
                .update_stock(&adjustment.part_id, adjustment.remaining_before)
            {
                error!(
                    part_id = %adjustment.part_id,
                    remaining_before = adjustment.remaining_before,
                    error = %e,
                    "补偿还原失败,库存计数器需人工核对"
                );
            }
        }
    }
}

fn validate_draft(draft: &CaseDraft) -> ApiResult<()> {
    if draft.title.trim().is_empty() {
        return Err(ApiError::InvalidInput("工单标题不能为空".to_string()));
    }
    if draft.customer_name.trim().is_empty() {
        return Err(ApiError::InvalidInput("客户名称不能为空".to_string()));
    }
    Ok(())
}
