// ==========================================
// 结算生成集成测试
// ==========================================
// 测试目标: 上传 → 价格解析 → 结算重建 → 报表 / 视图
// ==========================================

mod test_helpers;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use harvest_settlement::api::ApiError;
use harvest_settlement::app::AppState;
use harvest_settlement::config::config_keys;
use harvest_settlement::domain::{PriceRule, TOTAL_LABEL};
use std::collections::HashMap;
use std::io::Cursor;
use test_helpers::{
    build_xlsx, build_xlsx_with_time_serials, create_test_db, set_config, DeliveryRowBuilder,
};

fn upload(state: &AppState, rows: &[Vec<String>], staged: bool) {
    let data = build_xlsx(rows).unwrap();
    state.upload(&data, "entregas.xlsx", staged).unwrap();
}

fn add_rule(
    state: &AppState,
    container: &str,
    price: f64,
    crop_block: Option<&str>,
    age_minutes: i64,
) {
    let created_at = Utc::now() - Duration::minutes(age_minutes);
    let mut rule = PriceRule::general(container, price, created_at);
    rule.crop_block = crop_block.map(str::to_string);
    state.api.create_price_rule(&rule).unwrap();
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

#[test]
fn test_scenario_a_two_deliveries_priced_per_crate() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    add_rule(&state, "Crate", 2.0, None, 0);

    upload(
        &state,
        &[
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "10").build(),
            DeliveryRowBuilder::new("Luis", "2024-03-01", "Crate", "5").build(),
        ],
        false,
    );

    let run = state.api.generate_settlements(HashMap::new()).unwrap();
    assert_eq!(run.settlement_count, 2);
    assert_eq!(run.skipped_deliveries, 0);
    assert_eq!(run.total_cost, 30.0);
    assert!(run.filename.starts_with("liquidaciones_"));
    assert!(run.filename.ends_with(".xlsx"));

    let ana = state.api.get_settlements_for_worker("Ana").unwrap();
    assert_eq!(ana.len(), 1);
    assert_eq!(ana[0].label, TOTAL_LABEL);
    assert_eq!(ana[0].settle_date, date(1));
    assert_eq!(ana[0].piece_count, 10);
    assert_eq!(ana[0].piece_cost, ana[0].piece_count as f64 * 2.0);

    let luis = state.api.get_settlements_for_worker("Luis").unwrap();
    assert_eq!(luis[0].piece_cost, 10.0);
}

#[test]
fn test_worker_day_collapses_container_types() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    add_rule(&state, "Crate", 2.0, None, 0);
    add_rule(&state, "Bin", 7.5, None, 0);

    upload(
        &state,
        &[
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "10").build(),
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Bin", "2").build(),
            DeliveryRowBuilder::new("Ana", "2024-03-02", "Crate", "3").build(),
        ],
        false,
    );

    state.api.generate_settlements(HashMap::new()).unwrap();
    let ana = state.api.get_settlements_for_worker("Ana").unwrap();
    assert_eq!(ana.len(), 2);
    assert_eq!(ana[0].piece_count, 12);
    assert_eq!(ana[0].piece_cost, 35.0);
    assert!((ana[0].piece_count as f64 * ana[0].unit_price - ana[0].piece_cost).abs() < 0.005);
    assert_eq!(ana[1].settle_date, date(2));
}

#[test]
fn test_scenario_d_specific_rule_outranks_general() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    // 通用规则更新,但特定规则仍优先
    add_rule(&state, "Crate", 3.0, Some("C1"), 10);
    add_rule(&state, "Crate", 1.5, None, 0);

    upload(
        &state,
        &[
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "4").crop_block("C1").build(),
            DeliveryRowBuilder::new("Luis", "2024-03-01", "Crate", "2").crop_block("C2").build(),
        ],
        false,
    );

    state.api.generate_settlements(HashMap::new()).unwrap();
    let ana = state.api.get_settlements_for_worker("Ana").unwrap();
    assert_eq!(ana[0].unit_price, 3.0);
    assert_eq!(ana[0].piece_cost, 12.0);

    let luis = state.api.get_settlements_for_worker("Luis").unwrap();
    assert_eq!(luis[0].unit_price, 1.5);
    assert_eq!(luis[0].piece_cost, 3.0);
}

#[test]
fn test_scenario_e_unpriced_container_is_excluded() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    add_rule(&state, "Crate", 2.0, None, 0);

    upload(
        &state,
        &[
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "10").build(),
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Capacho", "50").build(),
            DeliveryRowBuilder::new("Eva", "2024-03-01", "Capacho", "8").build(),
        ],
        false,
    );

    let run = state.api.generate_settlements(HashMap::new()).unwrap();
    assert_eq!(run.skipped_deliveries, 2);
    assert_eq!(run.settlement_count, 1);
    assert_eq!(run.total_cost, 20.0);
    assert!(state.api.get_settlements_for_worker("Eva").unwrap().is_empty());
}

#[test]
fn test_price_overrides_bootstrap_general_rule_once() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    upload(
        &state,
        &[
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Capacho", "4").build(),
            DeliveryRowBuilder::new("Luis", "2024-03-01", "Capacho", "6").crop_block("C7").build(),
        ],
        false,
    );

    let overrides = HashMap::from([("Capacho".to_string(), 0.5)]);
    let run = state.api.generate_settlements(overrides.clone()).unwrap();
    assert_eq!(run.bootstrapped_rules, 1);
    assert_eq!(run.total_cost, 5.0);

    let rules = state.api.list_price_rules(Some("Capacho")).unwrap();
    assert_eq!(rules.len(), 1);
    assert!(rules[0].is_general());

    // 第二次直接命中已持久化的通用规则
    let run = state.api.generate_settlements(overrides).unwrap();
    assert_eq!(run.bootstrapped_rules, 0);
    assert_eq!(run.total_cost, 5.0);

    let run = state.api.generate_settlements(HashMap::new()).unwrap();
    assert_eq!(run.total_cost, 5.0);
}

#[test]
fn test_invalid_override_is_rejected() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    let err = state
        .api
        .generate_settlements(HashMap::from([("Crate".to_string(), -1.0)]))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_regeneration_replaces_previous_settlements() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    add_rule(&state, "Crate", 2.0, None, 0);

    upload(&state, &[DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "10").build()], false);
    state.api.generate_settlements(HashMap::new()).unwrap();

    upload(&state, &[DeliveryRowBuilder::new("Luis", "2024-03-05", "Crate", "1").build()], false);
    let run = state.api.generate_settlements(HashMap::new()).unwrap();

    assert_eq!(run.settlement_count, 1);
    assert!(state.api.get_settlements_for_worker("Ana").unwrap().is_empty());
    assert_eq!(state.api.get_settlements_for_worker("Luis").unwrap().len(), 1);
}

// ==========================================
// 报表
// ==========================================

#[test]
fn test_report_workbook_contents() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();
    add_rule(&state, "Crate", 2.0, None, 0);
    add_rule(&state, "Bin", 4.0, None, 0);
    upload(
        &state,
        &[
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "10").build(),
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Bin", "1").build(),
        ],
        false,
    );

    let run = state.api.generate_settlements(HashMap::new()).unwrap();
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(run.report_bytes)).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Liquidaciones", "Detalle", "Tabla Dinámica"]);

    let detail = workbook.worksheet_range("Liquidaciones").unwrap();
    assert_eq!(detail.get_value((0, 0)), Some(&Data::String("Trabajador".to_string())));
    assert_eq!(detail.get_value((1, 0)), Some(&Data::String("Ana".to_string())));
    assert_eq!(detail.get_value((1, 5)), Some(&Data::Float(24.0)));

    let summary = workbook.worksheet_range("Tabla Dinámica").unwrap();
    assert_eq!(summary.get_value((1, 2)), Some(&Data::String("Bin, Crate".to_string())));
    assert_eq!(summary.get_value((1, 3)), Some(&Data::Float(11.0)));
}

#[test]
fn test_report_per_worker_layout() {
    let (_tmp, db_path) = create_test_db().unwrap();
    set_config(&db_path, config_keys::REPORT_LAYOUT, "PER_WORKER").unwrap();
    let state = AppState::new(db_path).unwrap();
    add_rule(&state, "Crate", 2.0, None, 0);
    upload(
        &state,
        &[
            DeliveryRowBuilder::new("Ana: jefa", "2024-03-01", "Crate", "1").build(),
            DeliveryRowBuilder::new("Luis", "2024-03-01", "Crate", "1").build(),
        ],
        false,
    );

    let run = state.api.generate_settlements(HashMap::new()).unwrap();
    let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(run.report_bytes)).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec!["Ana_ jefa", "Luis", "Detalle", "Tabla Dinámica"]
    );
}

#[test]
fn test_empty_dataset_report_has_placeholder() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    let run = state.api.generate_settlements(HashMap::new()).unwrap();
    assert_eq!(run.settlement_count, 0);

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(run.report_bytes)).unwrap();
    let summary = workbook.worksheet_range("Tabla Dinámica").unwrap();
    assert_eq!(
        summary.get_value((1, 0)),
        Some(&Data::String("No hay datos para mostrar".to_string()))
    );
}

// ==========================================
// 聚合视图
// ==========================================

#[test]
fn test_views_unavailable_without_staging() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let state = AppState::new(db_path).unwrap();

    assert!(matches!(
        state.api.get_aggregated_settlements(None, None),
        Err(ApiError::Unavailable(_))
    ));
    assert!(matches!(
        state.api.get_worker_summary(None, None),
        Err(ApiError::Unavailable(_))
    ));
}

#[test]
fn test_views_with_staging() {
    let (_tmp, db_path) = create_test_db().unwrap();
    set_config(&db_path, config_keys::INGEST_MODE, "STAGED").unwrap();
    let state = AppState::new(db_path).unwrap();
    add_rule(&state, "Crate", 2.0, None, 0);
    add_rule(&state, "Bin", 4.0, None, 0);

    upload(
        &state,
        &[
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "10").time("8:15").build(),
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "5")
                .time("13:40")
                .field("Campo Sur")
                .crop_block("C2")
                .build(),
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Bin", "1").time("10:00").build(),
            DeliveryRowBuilder::new("Ana", "2024-03-01", "Capacho", "9").build(),
            DeliveryRowBuilder::new("Luis", "2024-03-04", "Crate", "2").build(),
        ],
        true,
    );

    let view = state.api.get_aggregated_settlements(None, Some(date(2))).unwrap();
    assert_eq!(view.len(), 2);
    let crates = view.iter().find(|r| r.container_type == "Crate").unwrap();
    assert_eq!(crates.record_count, 2);
    assert_eq!(crates.total_count, 15);
    assert_eq!(crates.total_cost, 30.0);
    assert_eq!(crates.average_price, 2.0);
    assert_eq!(crates.first_time, NaiveTime::from_hms_opt(8, 15, 0));
    assert_eq!(crates.last_time, NaiveTime::from_hms_opt(13, 40, 0));
    assert_eq!(crates.field_names, vec!["Campo Norte", "Campo Sur"]);
    assert_eq!(crates.crop_blocks, vec!["C1", "C2"]);
    assert_eq!(crates.worker_id, "ID-Ana");

    let summary = state.api.get_worker_summary(Some(date(1)), Some(date(31))).unwrap();
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].worker_name, "Ana");
    assert_eq!(summary[0].container_types, 2);
    assert_eq!(summary[0].total_pieces, 16);
    assert_eq!(summary[0].total_cost, 34.0);
    assert_eq!(summary[0].first_time, NaiveTime::from_hms_opt(8, 15, 0));
    assert_eq!(summary[0].last_time, NaiveTime::from_hms_opt(13, 40, 0));
    assert_eq!(summary[1].day, date(4));

    let err = state
        .api
        .get_worker_summary(Some(date(5)), Some(date(1)))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_excel_time_cells_flow_into_views_as_time_of_day() {
    let (_tmp, db_path) = create_test_db().unwrap();
    set_config(&db_path, config_keys::INGEST_MODE, "STAGED").unwrap();
    let state = AppState::new(db_path).unwrap();
    add_rule(&state, "Crate", 2.0, None, 0);

    // 0.35069444 ≈ 08:25:00, 0.6875 = 16:30:00
    let rows = vec![
        DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "3")
            .time("0.6875")
            .build(),
        DeliveryRowBuilder::new("Ana", "2024-03-01", "Crate", "4")
            .time("0.35069444")
            .build(),
    ];
    let data = build_xlsx_with_time_serials(&rows).unwrap();
    state.upload(&data, "entregas.xlsx", true).unwrap();

    let view = state.api.get_aggregated_settlements(None, None).unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].first_time, NaiveTime::from_hms_opt(8, 25, 0));
    assert_eq!(view[0].last_time, NaiveTime::from_hms_opt(16, 30, 0));
}
