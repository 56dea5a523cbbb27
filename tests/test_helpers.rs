// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use aftersales_tracker::api::{CaseDraft, NewSparePart};
use aftersales_tracker::app::AppState;
use aftersales_tracker::domain::case::UsageLine;
use aftersales_tracker::domain::types::CaseStatus;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件(需要保持存活)
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    aftersales_tracker::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = aftersales_tracker::db::open_sqlite_connection(&db_path)?;
    aftersales_tracker::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 基于临时数据库组装完整 AppState
pub fn create_test_app() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let app = AppState::new(db_path).map_err(|e| -> Box<dyn Error> { e.into() })?;
    Ok((temp_file, app))
}

/// 创建备件输入(剩余库存 = 总库存)
pub fn part_input(part_id: &str, name: &str, total_stock: i64) -> NewSparePart {
    NewSparePart {
        part_id: Some(part_id.to_string()),
        name: name.to_string(),
        unit: "个".to_string(),
        total_stock,
        remaining_stock: None,
        low_stock_threshold: None,
    }
}

/// 创建工单表单数据
pub fn case_draft(title: &str) -> CaseDraft {
    CaseDraft {
        title: title.to_string(),
        customer_name: "测试客户".to_string(),
        technician_id: None,
        status: CaseStatus::Open,
        reported_at: None,
        resolved_at: None,
    }
}

/// 创建消耗行(名称快照留空,由 CaseApi 从目录补齐)
pub fn usage(part_id: &str, quantity: i64) -> UsageLine {
    UsageLine::new(part_id, "", quantity)
}
