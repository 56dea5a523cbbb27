// ==========================================
// 售后维修管理系统 - 内存仓储实现
// ==========================================
// 职责: 为测试与嵌入场景提供与 SQLite 实现同契约的内存实现
// 约束: 读取时按 id 去重(容忍网关 at-least-once 投递),
//       不通过共享引用就地修改, 接口只进出不可变快照
// ==========================================

use crate::domain::case::MaintenanceCase;
use crate::domain::part::SparePart;
use crate::domain::technician::Technician;
use crate::repository::case_repo::CaseRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::part_repo::PartRepository;
use crate::repository::technician_repo::TechnicianRepository;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;

// ==========================================
// 内存表通用实现
// ==========================================

/// 行的主键访问
trait HasId {
    fn id(&self) -> &str;
}

impl HasId for SparePart {
    fn id(&self) -> &str {
        &self.part_id
    }
}

impl HasId for MaintenanceCase {
    fn id(&self) -> &str {
        &self.case_id
    }
}

impl HasId for Technician {
    fn id(&self) -> &str {
        &self.technician_id
    }
}

/// 内存表: Mutex<Vec<T>> + 按 id 去重读取
struct InMemoryTable<T> {
    entity: &'static str,
    rows: Mutex<Vec<T>>,
}

impl<T: Clone + HasId> InMemoryTable<T> {
    fn new(entity: &'static str) -> Self {
        Self {
            entity,
            rows: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Vec<T>>> {
        self.rows
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取全部行,重复 id 只保留首条
    fn find_all(&self) -> RepositoryResult<Vec<T>> {
        let rows = self.lock()?;
        let mut seen = HashSet::new();
        Ok(rows
            .iter()
            .filter(|row| seen.insert(row.id().to_string()))
            .cloned()
            .collect())
    }

    fn find_by_id(&self, id: &str) -> RepositoryResult<Option<T>> {
        let rows = self.lock()?;
        Ok(rows.iter().find(|row| row.id() == id).cloned())
    }

    fn insert(&self, item: T) -> RepositoryResult<()> {
        let mut rows = self.lock()?;
        if rows.iter().any(|row| row.id() == item.id()) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "{} id={} 已存在",
                self.entity,
                item.id()
            )));
        }
        rows.push(item);
        Ok(())
    }

    fn update(&self, item: T) -> RepositoryResult<()> {
        let mut rows = self.lock()?;
        match rows.iter_mut().find(|row| row.id() == item.id()) {
            Some(existing) => {
                *existing = item;
                Ok(())
            }
            None => Err(RepositoryError::NotFound {
                entity: self.entity.to_string(),
                id: item.id().to_string(),
            }),
        }
    }

    fn replace_all(&self, items: Vec<T>) -> RepositoryResult<()> {
        let mut rows = self.lock()?;
        *rows = items;
        Ok(())
    }

    fn delete(&self, id: &str) -> RepositoryResult<()> {
        let mut rows = self.lock()?;
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        if rows.len() == before {
            return Err(RepositoryError::NotFound {
                entity: self.entity.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

// ==========================================
// InMemoryPartRepository
// ==========================================

pub struct InMemoryPartRepository {
    table: InMemoryTable<SparePart>,
}

impl InMemoryPartRepository {
    pub fn new() -> Self {
        Self {
            table: InMemoryTable::new("SparePart"),
        }
    }
}

impl Default for InMemoryPartRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl PartRepository for InMemoryPartRepository {
    fn find_all(&self) -> RepositoryResult<Vec<SparePart>> {
        self.table.find_all()
    }

    fn find_by_id(&self, part_id: &str) -> RepositoryResult<Option<SparePart>> {
        self.table.find_by_id(part_id)
    }

    fn insert(&self, part: &SparePart) -> RepositoryResult<()> {
        self.table.insert(part.clone())
    }

    fn update(&self, part: &SparePart) -> RepositoryResult<()> {
        self.table.update(part.clone())
    }

    fn update_stock(&self, part_id: &str, remaining_stock: i64) -> RepositoryResult<()> {
        let mut part = self
            .table
            .find_by_id(part_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "SparePart".to_string(),
                id: part_id.to_string(),
            })?;
        part.remaining_stock = remaining_stock;
        part.updated_at = Utc::now();
        self.table.update(part)
    }

    fn replace_all(&self, parts: &[SparePart]) -> RepositoryResult<()> {
        self.table.replace_all(parts.to_vec())
    }

    fn delete(&self, part_id: &str) -> RepositoryResult<()> {
        self.table.delete(part_id)
    }
}

// ==========================================
// InMemoryCaseRepository
// ==========================================

pub struct InMemoryCaseRepository {
    table: InMemoryTable<MaintenanceCase>,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self {
            table: InMemoryTable::new("MaintenanceCase"),
        }
    }
}

impl Default for InMemoryCaseRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseRepository for InMemoryCaseRepository {
    fn find_all(&self) -> RepositoryResult<Vec<MaintenanceCase>> {
        self.table.find_all()
    }

    fn find_by_id(&self, case_id: &str) -> RepositoryResult<Option<MaintenanceCase>> {
        self.table.find_by_id(case_id)
    }

    fn insert(&self, case: &MaintenanceCase) -> RepositoryResult<()> {
        self.table.insert(case.clone())
    }

    fn update(&self, case: &MaintenanceCase) -> RepositoryResult<()> {
        self.table.update(case.clone())
    }

    fn replace_all(&self, cases: &[MaintenanceCase]) -> RepositoryResult<()> {
        self.table.replace_all(cases.to_vec())
    }

    fn delete(&self, case_id: &str) -> RepositoryResult<()> {
        self.table.delete(case_id)
    }
}

// ==========================================
// InMemoryTechnicianRepository
// ==========================================

pub struct InMemoryTechnicianRepository {
    table: InMemoryTable<Technician>,
}

impl InMemoryTechnicianRepository {
    pub fn new() -> Self {
        Self {
            table: InMemoryTable::new("Technician"),
        }
    }
}

impl Default for InMemoryTechnicianRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TechnicianRepository for InMemoryTechnicianRepository {
    fn find_all(&self) -> RepositoryResult<Vec<Technician>> {
        self.table.find_all()
    }

    fn find_by_id(&self, technician_id: &str) -> RepositoryResult<Option<Technician>> {
        self.table.find_by_id(technician_id)
    }

    fn insert(&self, technician: &Technician) -> RepositoryResult<()> {
        self.table.insert(technician.clone())
    }

    fn update(&self, technician: &Technician) -> RepositoryResult<()> {
        self.table.update(technician.clone())
    }

    fn replace_all(&self, technicians: &[Technician]) -> RepositoryResult<()> {
        self.table.replace_all(technicians.to_vec())
    }

    fn delete(&self, technician_id: &str) -> RepositoryResult<()> {
        self.table.delete(technician_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::part::SparePart;

    fn part(part_id: &str) -> SparePart {
        SparePart {
            part_id: part_id.to_string(),
            name: format!("备件{}", part_id),
            unit: "个".to_string(),
            total_stock: 10,
            remaining_stock: 10,
            low_stock_threshold: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_find_all_dedupes_by_id() {
        let repo = InMemoryPartRepository::new();
        // replace_all 直接灌入重复行,模拟 at-least-once 投递
        let mut dup = part("P001");
        dup.remaining_stock = 3;
        repo.replace_all(&[part("P001"), dup, part("P002")]).unwrap();

        let all = repo.find_all().unwrap();
        assert_eq!(all.len(), 2);
        // 保留首条
        assert_eq!(all[0].remaining_stock, 10);
    }

    #[test]
    fn test_insert_duplicate_id_rejected() {
        let repo = InMemoryPartRepository::new();
        repo.insert(&part("P001")).unwrap();
        let err = repo.insert(&part("P001")).unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::UniqueConstraintViolation(_)
        ));
    }

    #[test]
    fn test_update_stock_missing_part() {
        let repo = InMemoryPartRepository::new();
        let err = repo.update_stock("P404", 1).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
