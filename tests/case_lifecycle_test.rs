// ==========================================
// 维修工单生命周期端到端测试
// ==========================================
// 职责: 验证 创建->更新->删除 全链路的库存一致性,
//       包括守恒性质、整体回绝、缺目录降级与补偿还原
// ==========================================

mod test_helpers;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aftersales_tracker::api::{new_commit_lock, ApiError, CaseApi};
use aftersales_tracker::app::AppState;
use aftersales_tracker::domain::case::MaintenanceCase;
use aftersales_tracker::domain::types::CaseStatus;
use aftersales_tracker::engine::StockReconciler;
use aftersales_tracker::repository::error::{RepositoryError, RepositoryResult};
use aftersales_tracker::repository::{
    CaseRepository, InMemoryCaseRepository, InMemoryPartRepository, PartRepository,
};
use test_helpers::{case_draft, create_test_app, part_input, usage};

/// 断言守恒式: total - remaining == 全部在册工单占用之和
fn assert_conservation(app: &AppState, part_id: &str) {
    let part = app.part_api.get_part(part_id).unwrap().unwrap();
    let committed = app.case_api.committed_usage_total(part_id).unwrap();
    assert_eq!(
        part.total_stock - part.remaining_stock,
        committed,
        "守恒式被破坏: part_id={}",
        part_id
    );
}

// ==========================================
// 标准场景(规格 10/4/7/12 链路)
// ==========================================

#[test]
fn test_standard_scenario_chain() {
    let (_tmp, app) = create_test_app().unwrap();
    app.part_api.create_part(part_input("P", "压缩机", 10)).unwrap();

    // create(C1, [P×4]) -> remaining=6
    let c1 = app
        .case_api
        .create_case(case_draft("冰箱不制冷"), &[usage("P", 4)])
        .unwrap();
    assert_eq!(app.part_api.get_part("P").unwrap().unwrap().remaining_stock, 6);
    assert_conservation(&app, "P");

    // update(C1, [P×7]) -> remaining=3
    app.case_api
        .update_case(&c1.case_id, case_draft("冰箱不制冷"), &[usage("P", 7)])
        .unwrap();
    assert_eq!(app.part_api.get_part("P").unwrap().unwrap().remaining_stock, 3);
    assert_conservation(&app, "P");

    // delete(C1) -> remaining=10
    app.case_api.delete_case(&c1.case_id).unwrap();
    assert_eq!(app.part_api.get_part("P").unwrap().unwrap().remaining_stock, 10);
    assert_conservation(&app, "P");

    // create(C2, [P×12]) -> InsufficientStock{P,12,10},remaining 仍为 10
    let err = app
        .case_api
        .create_case(case_draft("空调漏水"), &[usage("P", 12)])
        .unwrap_err();
    match err {
        ApiError::InsufficientStock {
            part_id,
            requested,
            available,
        } => {
            assert_eq!(part_id, "P");
            assert_eq!(requested, 12);
            assert_eq!(available, 10);
        }
        other => panic!("期望 InsufficientStock,实际: {:?}", other),
    }
    assert_eq!(app.part_api.get_part("P").unwrap().unwrap().remaining_stock, 10);
    // 失败的创建不得留下工单记录
    assert!(app.case_api.list_cases(None).unwrap().is_empty());
}

#[test]
fn test_delete_restores_to_pre_create_value() {
    let (_tmp, app) = create_test_app().unwrap();
    app.part_api.create_part(part_input("P", "压缩机", 15)).unwrap();
    app.part_api.restock("P", 5).unwrap(); // total=20, remaining=20

    let before = app.part_api.get_part("P").unwrap().unwrap();
    let case = app
        .case_api
        .create_case(case_draft("维修"), &[usage("P", 8)])
        .unwrap();
    app.case_api.delete_case(&case.case_id).unwrap();

    let after = app.part_api.get_part("P").unwrap().unwrap();
    assert_eq!(after.remaining_stock, before.remaining_stock);
    assert_eq!(after.total_stock, before.total_stock);
}

#[test]
fn test_update_idempotence_against_delete_recreate() {
    // update(case, usage2) 之后的库存 == delete(case); create(usage2) 之后的库存
    let (_tmp, app1) = create_test_app().unwrap();
    app1.part_api.create_part(part_input("P", "压缩机", 20)).unwrap();
    let c = app1
        .case_api
        .create_case(case_draft("维修"), &[usage("P", 5)])
        .unwrap();
    app1.case_api
        .update_case(&c.case_id, case_draft("维修"), &[usage("P", 9)])
        .unwrap();
    let via_update = app1.part_api.get_part("P").unwrap().unwrap().remaining_stock;

    let (_tmp2, app2) = create_test_app().unwrap();
    app2.part_api.create_part(part_input("P", "压缩机", 20)).unwrap();
    let c = app2
        .case_api
        .create_case(case_draft("维修"), &[usage("P", 5)])
        .unwrap();
    app2.case_api.delete_case(&c.case_id).unwrap();
    app2.case_api
        .create_case(case_draft("维修"), &[usage("P", 9)])
        .unwrap();
    let via_recreate = app2.part_api.get_part("P").unwrap().unwrap().remaining_stock;

    assert_eq!(via_update, via_recreate);
    assert_eq!(via_update, 11);
}

#[test]
fn test_atomic_rejection_leaves_all_parts_untouched() {
    let (_tmp, app) = create_test_app().unwrap();
    app.part_api.create_part(part_input("A", "压缩机", 10)).unwrap();
    app.part_api.create_part(part_input("B", "冷凝器", 3)).unwrap();

    let a_before = app.part_api.get_part("A").unwrap().unwrap();
    let b_before = app.part_api.get_part("B").unwrap().unwrap();

    // A 足量,B 超量: 整体回绝
    let err = app
        .case_api
        .create_case(case_draft("维修"), &[usage("A", 2), usage("B", 4)])
        .unwrap_err();
    assert!(matches!(err, ApiError::InsufficientStock { .. }));

    // 每个备件的库存字段逐字节不变
    assert_eq!(app.part_api.get_part("A").unwrap().unwrap(), a_before);
    assert_eq!(app.part_api.get_part("B").unwrap().unwrap(), b_before);
}

// ==========================================
// 目录缺失降级
// ==========================================

#[test]
fn test_deleted_part_allows_return_but_blocks_increase() {
    let (_tmp, app) = create_test_app().unwrap();
    app.part_api.create_part(part_input("P", "压缩机", 10)).unwrap();
    let case = app
        .case_api
        .create_case(case_draft("维修"), &[usage("P", 4)])
        .unwrap();

    // 备件从目录删除,工单清单成为孤儿引用
    app.part_api.delete_part("P").unwrap();

    // 增量被拒绝: 缺失备件可用量按 0 降级
    let err = app
        .case_api
        .update_case(&case.case_id, case_draft("维修"), &[usage("P", 5)])
        .unwrap_err();
    match err {
        ApiError::InsufficientStock { available, .. } => assert_eq!(available, 4),
        other => panic!("期望 InsufficientStock,实际: {:?}", other),
    }

    // 纯减量放行
    app.case_api
        .update_case(&case.case_id, case_draft("维修"), &[usage("P", 2)])
        .unwrap();

    // 删除工单(纯归还)永不被缺失目录阻断
    app.case_api.delete_case(&case.case_id).unwrap();
    assert!(app.case_api.get_case(&case.case_id).unwrap().is_none());
}

// ==========================================
// 清单语义
// ==========================================

#[test]
fn test_duplicate_lines_merge_in_committed_ledger() {
    let (_tmp, app) = create_test_app().unwrap();
    app.part_api.create_part(part_input("P", "压缩机", 10)).unwrap();

    let case = app
        .case_api
        .create_case(case_draft("维修"), &[usage("P", 2), usage("P", 3)])
        .unwrap();

    // 重复行合并为一行,数量累加
    assert_eq!(case.spare_parts_used.len(), 1);
    assert_eq!(case.spare_parts_used[0].quantity, 5);
    assert_eq!(app.part_api.get_part("P").unwrap().unwrap().remaining_stock, 5);
}

#[test]
fn test_part_name_is_point_in_time_snapshot() {
    let (_tmp, app) = create_test_app().unwrap();
    app.part_api.create_part(part_input("P", "压缩机", 10)).unwrap();

    let case = app
        .case_api
        .create_case(case_draft("维修"), &[usage("P", 1)])
        .unwrap();
    assert_eq!(case.spare_parts_used[0].part_name, "压缩机");

    // 备件改名不回写历史清单
    let mut part = app.part_api.get_part("P").unwrap().unwrap();
    part.name = "变频压缩机".to_string();
    app.part_api.edit_part(part).unwrap();

    let stored = app.case_api.get_case(&case.case_id).unwrap().unwrap();
    assert_eq!(stored.spare_parts_used[0].part_name, "压缩机");
}

#[test]
fn test_list_cases_filters_by_status() {
    let (_tmp, app) = create_test_app().unwrap();
    app.part_api.create_part(part_input("P", "压缩机", 10)).unwrap();

    let c1 = app
        .case_api
        .create_case(case_draft("维修一"), &[usage("P", 1)])
        .unwrap();
    app.case_api.create_case(case_draft("维修二"), &[]).unwrap();

    let mut draft = case_draft("维修一");
    draft.status = CaseStatus::Resolved;
    app.case_api
        .update_case(&c1.case_id, draft, &[usage("P", 1)])
        .unwrap();

    assert_eq!(
        app.case_api
            .list_cases(Some(CaseStatus::Resolved))
            .unwrap()
            .len(),
        1
    );
    assert_eq!(app.case_api.list_cases(None).unwrap().len(), 2);
}

// ==========================================
// 补偿还原(工单写入失败时目录必须回到提交前)
// ==========================================

/// 可注入写入失败的工单仓储包装
struct FailingCaseRepository {
    inner: InMemoryCaseRepository,
    fail_writes: AtomicBool,
}

impl FailingCaseRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryCaseRepository::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> RepositoryResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseQueryError(
                "模拟写入失败".to_string(),
            ));
        }
        Ok(())
    }
}

impl CaseRepository for FailingCaseRepository {
    fn find_all(&self) -> RepositoryResult<Vec<MaintenanceCase>> {
        self.inner.find_all()
    }

    fn find_by_id(&self, case_id: &str) -> RepositoryResult<Option<MaintenanceCase>> {
        self.inner.find_by_id(case_id)
    }

    fn insert(&self, case: &MaintenanceCase) -> RepositoryResult<()> {
        self.check()?;
        self.inner.insert(case)
    }

    fn update(&self, case: &MaintenanceCase) -> RepositoryResult<()> {
        self.check()?;
        self.inner.update(case)
    }

    fn replace_all(&self, cases: &[MaintenanceCase]) -> RepositoryResult<()> {
        self.check()?;
        self.inner.replace_all(cases)
    }

    fn delete(&self, case_id: &str) -> RepositoryResult<()> {
        self.check()?;
        self.inner.delete(case_id)
    }
}

fn seeded_part_repo() -> Arc<InMemoryPartRepository> {
    let repo = Arc::new(InMemoryPartRepository::new());
    repo.insert(&aftersales_tracker::SparePart {
        part_id: "P".to_string(),
        name: "压缩机".to_string(),
        unit: "台".to_string(),
        total_stock: 10,
        remaining_stock: 10,
        low_stock_threshold: 5,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    })
    .unwrap();
    repo
}

#[test]
fn test_create_failure_compensates_catalog() {
    let part_repo = seeded_part_repo();
    let case_repo = Arc::new(FailingCaseRepository::new());
    let api = CaseApi::new(
        case_repo.clone(),
        part_repo.clone(),
        StockReconciler::new(),
        new_commit_lock(),
    );

    case_repo.set_fail_writes(true);
    let err = api
        .create_case(case_draft("维修"), &[usage("P", 4)])
        .unwrap_err();
    assert!(matches!(err, ApiError::DatabaseError(_)));

    // 目录已补偿还原到提交前
    let part = part_repo.find_by_id("P").unwrap().unwrap();
    assert_eq!(part.remaining_stock, 10);
    assert!(case_repo.find_all().unwrap().is_empty());
}

#[test]
fn test_update_failure_compensates_catalog() {
    let part_repo = seeded_part_repo();
    let case_repo = Arc::new(FailingCaseRepository::new());
    let api = CaseApi::new(
        case_repo.clone(),
        part_repo.clone(),
        StockReconciler::new(),
        new_commit_lock(),
    );

    let case = api.create_case(case_draft("维修"), &[usage("P", 4)]).unwrap();
    assert_eq!(part_repo.find_by_id("P").unwrap().unwrap().remaining_stock, 6);

    case_repo.set_fail_writes(true);
    let err = api
        .update_case(&case.case_id, case_draft("维修"), &[usage("P", 7)])
        .unwrap_err();
    assert!(matches!(err, ApiError::DatabaseError(_)));

    // remaining 回到更新前的 6,工单清单仍是旧值
    assert_eq!(part_repo.find_by_id("P").unwrap().unwrap().remaining_stock, 6);
    let stored = case_repo.find_by_id(&case.case_id).unwrap().unwrap();
    assert_eq!(stored.quantity_for("P"), 4);
}

#[test]
fn test_delete_failure_compensates_catalog() {
    let part_repo = seeded_part_repo();
    let case_repo = Arc::new(FailingCaseRepository::new());
    let api = CaseApi::new(
        case_repo.clone(),
        part_repo.clone(),
        StockReconciler::new(),
        new_commit_lock(),
    );

    let case = api.create_case(case_draft("维修"), &[usage("P", 4)]).unwrap();

    case_repo.set_fail_writes(true);
    let err = api.delete_case(&case.case_id).unwrap_err();
    assert!(matches!(err, ApiError::DatabaseError(_)));

    // 归还被回滚,工单仍在
    assert_eq!(part_repo.find_by_id("P").unwrap().unwrap().remaining_stock, 6);
    assert!(case_repo.find_by_id(&case.case_id).unwrap().is_some());
}

// ==========================================
// 多工单守恒
// ==========================================

#[test]
fn test_conservation_across_interleaved_cases() {
    let (_tmp, app) = create_test_app().unwrap();
    app.part_api.create_part(part_input("P", "压缩机", 30)).unwrap();
    app.part_api.create_part(part_input("Q", "冷凝器", 12)).unwrap();

    let c1 = app
        .case_api
        .create_case(case_draft("维修一"), &[usage("P", 4), usage("Q", 2)])
        .unwrap();
    assert_conservation(&app, "P");
    assert_conservation(&app, "Q");

    let c2 = app
        .case_api
        .create_case(case_draft("维修二"), &[usage("P", 9)])
        .unwrap();
    assert_conservation(&app, "P");

    app.case_api
        .update_case(&c1.case_id, case_draft("维修一"), &[usage("P", 6)])
        .unwrap();
    assert_conservation(&app, "P");
    assert_conservation(&app, "Q"); // Q 被移除,占用归零

    app.part_api.restock("P", 10).unwrap();
    assert_conservation(&app, "P");

    app.case_api.delete_case(&c2.case_id).unwrap();
    assert_conservation(&app, "P");

    app.case_api.delete_case(&c1.case_id).unwrap();
    assert_conservation(&app, "P");

    let p = app.part_api.get_part("P").unwrap().unwrap();
    assert_eq!(p.total_stock, 40);
    assert_eq!(p.remaining_stock, 40);
}
