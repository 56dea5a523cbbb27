// ==========================================
// 库存对账引擎测试
// ==========================================
// 职责: 验证先还原后扣减公式在多步场景下的组合行为
// 场景: 创建 -> 改量 -> 删除 -> 超量申请 的标准链路
// ==========================================

use aftersales_tracker::domain::case::UsageLine;
use aftersales_tracker::domain::part::SparePart;
use aftersales_tracker::engine::{ReconcileError, StockReconciler};
use chrono::Utc;
use std::collections::HashMap;

// ==========================================
// 测试辅助函数
// ==========================================

fn make_part(part_id: &str, total: i64, remaining: i64) -> SparePart {
    SparePart {
        part_id: part_id.to_string(),
        name: format!("备件{}", part_id),
        unit: "个".to_string(),
        total_stock: total,
        remaining_stock: remaining,
        low_stock_threshold: 5,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn catalog(parts: &[SparePart]) -> HashMap<String, SparePart> {
    parts
        .iter()
        .map(|p| (p.part_id.clone(), p.clone()))
        .collect()
}

fn line(part_id: &str, qty: i64) -> UsageLine {
    UsageLine::new(part_id, format!("备件{}", part_id), qty)
}

/// 把对账计划施加到目录快照上,返回新的快照
fn apply_plan(
    parts: &HashMap<String, SparePart>,
    plan: &aftersales_tracker::engine::ReconcilePlan,
) -> HashMap<String, SparePart> {
    let mut next = parts.clone();
    for adj in &plan.adjustments {
        if let Some(part) = next.get_mut(&adj.part_id) {
            part.remaining_stock = adj.remaining_after;
        }
    }
    next
}

// ==========================================
// 标准场景链路
// ==========================================

#[test]
fn test_create_update_delete_chain() {
    let reconciler = StockReconciler::new();
    // P 初始 remaining=10, total=10
    let mut parts = catalog(&[make_part("P", 10, 10)]);

    // create(C1, [P×4]) -> remaining=6
    let plan = reconciler.plan(&parts, &[], &[line("P", 4)]).unwrap();
    parts = apply_plan(&parts, &plan);
    assert_eq!(parts["P"].remaining_stock, 6);

    // update(C1, [P×7]) -> remaining = max(0,(6+4)-7) = 3
    let plan = reconciler
        .plan(&parts, &[line("P", 4)], &[line("P", 7)])
        .unwrap();
    parts = apply_plan(&parts, &plan);
    assert_eq!(parts["P"].remaining_stock, 3);

    // delete(C1) -> remaining = 3+7 = 10
    let plan = reconciler.plan(&parts, &[line("P", 7)], &[]).unwrap();
    parts = apply_plan(&parts, &plan);
    assert_eq!(parts["P"].remaining_stock, 10);

    // create(C2, [P×12]) -> InsufficientStock{P, 12, 10},库存不变
    let err = reconciler.plan(&parts, &[], &[line("P", 12)]).unwrap_err();
    assert_eq!(
        err,
        ReconcileError::InsufficientStock {
            part_id: "P".to_string(),
            requested: 12,
            available: 10,
        }
    );
    assert_eq!(parts["P"].remaining_stock, 10);
}

#[test]
fn test_update_equals_delete_then_create() {
    let reconciler = StockReconciler::new();
    let initial = catalog(&[make_part("P", 20, 20)]);

    // 路径一: create(usage1) 后直接 update(usage2)
    let plan = reconciler.plan(&initial, &[], &[line("P", 5)]).unwrap();
    let after_create = apply_plan(&initial, &plan);
    let plan = reconciler
        .plan(&after_create, &[line("P", 5)], &[line("P", 9)])
        .unwrap();
    let via_update = apply_plan(&after_create, &plan);

    // 路径二: delete 后重新 create(usage2)
    let plan = reconciler
        .plan(&after_create, &[line("P", 5)], &[])
        .unwrap();
    let after_delete = apply_plan(&after_create, &plan);
    let plan = reconciler.plan(&after_delete, &[], &[line("P", 9)]).unwrap();
    let via_recreate = apply_plan(&after_delete, &plan);

    assert_eq!(
        via_update["P"].remaining_stock,
        via_recreate["P"].remaining_stock
    );
    assert_eq!(via_update["P"].remaining_stock, 11);
}

#[test]
fn test_multi_part_update_mixes_add_change_remove() {
    let reconciler = StockReconciler::new();
    let parts = catalog(&[
        make_part("A", 10, 7), // 旧占用 3
        make_part("B", 10, 6), // 旧占用 4
        make_part("C", 10, 10),
    ]);

    let old = vec![line("A", 3), line("B", 4)];
    // A 改量 3->5, B 移除, C 新增 2
    let new = vec![line("A", 5), line("C", 2)];

    let plan = reconciler.plan(&parts, &old, &new).unwrap();
    let next = apply_plan(&parts, &plan);

    assert_eq!(next["A"].remaining_stock, 5); // (7+3)-5
    assert_eq!(next["B"].remaining_stock, 10); // (6+4)-0
    assert_eq!(next["C"].remaining_stock, 8); // (10+0)-2
    assert_eq!(plan.adjustments.len(), 3);
}

#[test]
fn test_rejected_plan_has_no_partial_adjustments() {
    let reconciler = StockReconciler::new();
    let parts = catalog(&[make_part("A", 10, 10), make_part("B", 10, 1)]);

    // A 足量在前,B 超量在后: 返回错误,无任何调整可施加
    let err = reconciler
        .plan(&parts, &[], &[line("A", 2), line("B", 5)])
        .unwrap_err();
    assert!(matches!(err, ReconcileError::InsufficientStock { .. }));
}

#[test]
fn test_conservation_over_random_style_sequence() {
    let reconciler = StockReconciler::new();
    let mut parts = catalog(&[make_part("P", 30, 30)]);

    // 模拟多工单交错操作,每步之后守恒式都必须成立:
    // total - remaining == 所有在册工单占用之和
    let mut ledgers: HashMap<&str, Vec<UsageLine>> = HashMap::new();
    let steps: Vec<(&str, Vec<UsageLine>)> = vec![
        ("C1", vec![line("P", 4)]),
        ("C2", vec![line("P", 9)]),
        ("C1", vec![line("P", 6)]),
        ("C3", vec![line("P", 11)]),
        ("C2", vec![]),
        ("C3", vec![line("P", 2)]),
        ("C1", vec![]),
    ];

    for (case_id, new_usage) in steps {
        let old_usage = ledgers.get(case_id).cloned().unwrap_or_default();
        let plan = reconciler.plan(&parts, &old_usage, &new_usage).unwrap();
        parts = apply_plan(&parts, &plan);
        if new_usage.is_empty() {
            ledgers.remove(case_id);
        } else {
            ledgers.insert(case_id, new_usage);
        }

        let committed_total: i64 = ledgers
            .values()
            .flat_map(|usage| usage.iter())
            .filter(|l| l.part_id == "P")
            .map(|l| l.quantity)
            .sum();
        assert_eq!(
            parts["P"].total_stock - parts["P"].remaining_stock,
            committed_total,
            "守恒式被破坏"
        );
    }

    // 全部归还后回到满库存
    assert_eq!(parts["P"].remaining_stock, 28); // C3 仍占用 2
}
