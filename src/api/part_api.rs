// ==========================================
// 售后维修管理系统 - 备件目录 API
// ==========================================
// 职责: 备件主数据维护(创建/补货/编辑/删除/查询)
// 约束: total_stock 只经 restock 增加;
//       edit_part 是管理员逃生通道,允许直接改写 remaining_stock,
//       不复核库存不变量(只告警),删除不级联工单消耗清单
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::StockCommitLock;
use crate::config::ConfigManager;
use crate::domain::part::SparePart;
use crate::repository::part_repo::PartRepository;

// ==========================================
// NewSparePart - 创建输入
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSparePart {
    pub part_id: Option<String>,         // 缺省时生成 uuid
    pub name: String,
    pub unit: String,
    pub total_stock: i64,
    pub remaining_stock: Option<i64>,    // 缺省时等于 total_stock
    pub low_stock_threshold: Option<i64>, // 缺省时取配置默认值
}

// ==========================================
// PartView - 列表展示视图(含健康度分类)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartView {
    pub part_id: String,
    pub name: String,
    pub unit: String,
    pub total_stock: i64,
    pub remaining_stock: i64,
    pub low_stock_threshold: i64,
    pub stock_health: String,
}

/// 库存健康度汇总(驾驶舱展示)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockSummary {
    pub total: usize,
    pub normal: usize,
    pub low: usize,
    pub out: usize,
}

// ==========================================
// PartApi - 备件目录 API
// ==========================================
pub struct PartApi {
    part_repo: Arc<dyn PartRepository>,
    config_manager: Arc<ConfigManager>,

    // 与 CaseApi 共用的库存提交锁: 补货/编辑/删除改写库存计数器,
    // 落在工单提交的目录读取与写回之间会被静默覆盖
    commit_lock: StockCommitLock,
}

impl PartApi {
    /// 创建新的 PartApi 实例
    ///
    /// commit_lock 必须与操作同一目录的 CaseApi 共用一把
    pub fn new(
        part_repo: Arc<dyn PartRepository>,
        config_manager: Arc<ConfigManager>,
        commit_lock: StockCommitLock,
    ) -> Self {
        Self {
            part_repo,
            config_manager,
            commit_lock,
        }
    }

    fn lock_commits(&self) -> ApiResult<std::sync::MutexGuard<'_, ()>> {
        self.commit_lock
            .lock()
            .map_err(|e| ApiError::InternalError(format!("提交锁获取失败: {}", e)))
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 创建备件
    ///
    /// 剩余库存缺省等于总库存;低库存阈值缺省取配置默认值
    pub fn create_part(&self, input: NewSparePart) -> ApiResult<SparePart> {
        if input.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("备件名称不能为空".to_string()));
        }
        if input.unit.trim().is_empty() {
            return Err(ApiError::InvalidInput("计量单位不能为空".to_string()));
        }
        if input.total_stock < 0 {
            return Err(ApiError::InvalidInput(format!(
                "总库存不能为负数: {}",
                input.total_stock
            )));
        }
        if let Some(remaining) = input.remaining_stock {
            if remaining < 0 {
                return Err(ApiError::InvalidInput(format!(
                    "剩余库存不能为负数: {}",
                    remaining
                )));
            }
        }

        let threshold = match input.low_stock_threshold {
            Some(t) => t,
            None => self
                .config_manager
                .default_low_stock_threshold()
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        };

        let now = Utc::now();
        let part = SparePart {
            part_id: input
                .part_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: input.name.trim().to_string(),
            unit: input.unit.trim().to_string(),
            total_stock: input.total_stock,
            remaining_stock: input.remaining_stock.unwrap_or(input.total_stock),
            low_stock_threshold: threshold,
            created_at: now,
            updated_at: now,
        };

        if part.remaining_stock > part.total_stock {
            warn!(
                part_id = %part.part_id,
                remaining = part.remaining_stock,
                total = part.total_stock,
                "创建备件时剩余库存超过总库存(按输入保留)"
            );
        }

        self.part_repo.insert(&part)?;
        debug!(part_id = %part.part_id, name = %part.name, "备件已创建");
        Ok(part)
    }

    /// 补货: total_stock 与 remaining_stock 同增 qty
    ///
    /// # 校验
    /// - qty 必须为正数
    /// - 备件不存在返回 NotFound
    pub fn restock(&self, part_id: &str, qty: i64) -> ApiResult<SparePart> {
        if qty <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "补货数量必须为正数: {}",
                qty
            )));
        }
        let _guard = self.lock_commits()?;

        let mut part = self
            .part_repo
            .find_by_id(part_id)?
            .ok_or_else(|| ApiError::NotFound(format!("SparePart(id={})不存在", part_id)))?;

        part.total_stock += qty;
        part.remaining_stock += qty;
        part.updated_at = Utc::now();
        self.part_repo.update(&part)?;

        debug!(
            part_id = %part.part_id,
            qty,
            total = part.total_stock,
            remaining = part.remaining_stock,
            "备件已补货"
        );
        Ok(part)
    }

    /// 编辑备件(全字段覆盖,管理员逃生通道)
    ///
    /// 允许直接改写 remaining_stock,包括超过 total_stock 的值;
    /// 不复核库存不变量,仅记录告警
    pub fn edit_part(&self, mut part: SparePart) -> ApiResult<SparePart> {
        if part.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("备件名称不能为空".to_string()));
        }
        let _guard = self.lock_commits()?;

        if part.remaining_stock > part.total_stock || part.remaining_stock < 0 {
            warn!(
                part_id = %part.part_id,
                remaining = part.remaining_stock,
                total = part.total_stock,
                "管理员直接改写库存计数器,已绕过库存不变量"
            );
        }

        part.updated_at = Utc::now();
        self.part_repo.update(&part)?;
        Ok(part)
    }

    /// 删除备件
    ///
    /// 不级联清理工单消耗清单: 历史清单继续引用该 part_id,
    /// 后续对账把缺失备件的可用量降级为 0,纯归还路径仍然放行
    pub fn delete_part(&self, part_id: &str) -> ApiResult<()> {
        let _guard = self.lock_commits()?;
        self.part_repo.delete(part_id)?;
        debug!(part_id = %part_id, "备件已删除(工单消耗清单不级联)");
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按主键查询备件
    pub fn get_part(&self, part_id: &str) -> ApiResult<Option<SparePart>> {
        Ok(self.part_repo.find_by_id(part_id)?)
    }

    /// 查询备件列表(含健康度分类)
    pub fn list_parts(&self) -> ApiResult<Vec<PartView>> {
        let parts = self.part_repo.find_all()?;
        Ok(parts
            .into_iter()
            .map(|p| {
                let health = p.stock_health().to_string();
                PartView {
                    part_id: p.part_id,
                    name: p.name,
                    unit: p.unit,
                    total_stock: p.total_stock,
                    remaining_stock: p.remaining_stock,
                    low_stock_threshold: p.low_stock_threshold,
                    stock_health: health,
                }
            })
            .collect())
    }

    /// 库存健康度汇总
    pub fn stock_summary(&self) -> ApiResult<StockSummary> {
        let parts = self.part_repo.find_all()?;
        let mut summary = StockSummary {
            total: parts.len(),
            ..Default::default()
        };
        for part in &parts {
            match part.stock_health() {
                crate::domain::types::StockHealth::Normal => summary.normal += 1,
                crate::domain::types::StockHealth::Low => summary.low += 1,
                crate::domain::types::StockHealth::Out => summary.out += 1,
            }
        }
        Ok(summary)
    }
}
