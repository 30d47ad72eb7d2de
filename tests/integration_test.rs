//! 集成測試

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use replen::*;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
}

/// 分析日結束時間（窗口終點）
fn window_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 16, 0, 0, 0).unwrap()
}

fn days_ago(days: i64) -> DateTime<Utc> {
    window_end() - Duration::days(days)
}

struct Shop {
    store: Arc<MemoryStore>,
    clock: Arc<FixedClock>,
    engine: ForecastEngine,
}

/// 建立一個供應商與三個商品的場景
///
/// - 商品 1：缺貨 20 天後補貨到 50，售出 160，月上限 10
/// - 商品 2：商品 3 的變體，父商品 50 天前上架，售出 25，庫存 100
/// - 商品 4：舊系統缺貨比例 20%，50 天前匯入，售出 90，無庫存
fn shop() -> Shop {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::new(window_end()));

    store.set_settings(GlobalSettings::new(dec!(6), 100));
    store.insert_supplier(
        Supplier::new(7, "Harbour Pottery".to_string(), 2, "EUR".to_string())
            .with_buffer_months(dec!(1)),
    );

    store.insert_product(Product::new(1, "MUG-01".to_string(), "Mug".to_string(), dec!(50)));
    store.set_meta(1, "max_order_qty_per_month", "10");
    store.record_sale(1, days_ago(5), dec!(160), OrderStatus::Completed);

    store.insert_product(
        Product::new(3, "BOWL".to_string(), "Bowl".to_string(), Decimal::ZERO)
            .with_created_at(days_ago(50)),
    );
    store.insert_product(
        Product::new(2, "BOWL-L".to_string(), "Bowl (large)".to_string(), dec!(100))
            .with_parent_id(3)
            .with_created_at(days_ago(5)),
    );
    store.record_sale(2, days_ago(10), dec!(25), OrderStatus::Processing);

    store.insert_product(Product::new(4, "JUG".to_string(), "Jug".to_string(), Decimal::ZERO));
    store.insert_legacy(LegacyHistoryRecord::new(4, dec!(60), dec!(240), days_ago(50)));
    store.record_sale(4, days_ago(30), dec!(90), OrderStatus::Completed);
    store.record_sale(4, days_ago(30), dec!(500), OrderStatus::Refunded);

    store.assign_products(7, vec![1, 2, 4]);

    let engine = ForecastEngine::new(
        collaborators_from(store.clone(), clock.clone()),
        ForecastConfig::default(),
    )
    .with_as_of(as_of());

    // 商品 1 的即時缺貨紀錄
    clock.set(days_ago(40));
    assert_eq!(
        engine.ledger().record_stock_change(&StockChange::new(1, 0, Decimal::ZERO)),
        StockTransition::Opened
    );
    clock.set(days_ago(20));
    assert_eq!(
        engine.ledger().record_stock_change(&StockChange::new(1, 0, dec!(50))),
        StockTransition::Closed
    );
    clock.set(window_end());

    Shop {
        store,
        clock,
        engine,
    }
}

#[test]
fn test_supplier_forecast_end_to_end() {
    let shop = shop();

    let report = shop.engine.forecast_supplier_report(7);
    assert!(report.warnings.is_empty());
    assert_eq!(report.rows.len(), 3);

    let policy = report.policy.clone().unwrap();
    assert_eq!(policy.lead_days(), dec!(14));
    assert_eq!(policy.buffer_months, dec!(1));
    assert_eq!(policy.lookback_days, 100);

    let row = |id: EntityId| report.rows.iter().find(|r| r.product_id == id).unwrap();

    // 商品 1：在售 80 天 → 每日 2
    let mug = row(1);
    assert_eq!(mug.live_stockout_days, dec!(20));
    assert_eq!(mug.days_on_sale, dec!(80));
    assert_eq!(mug.demand_per_day, dec!(2));
    assert_eq!(mug.stock_at_arrival, dec!(22));
    assert_eq!(mug.buffer_target, dec!(60.875));
    assert_eq!(mug.suggested_raw, dec!(38.875));
    assert_eq!(mug.max_for_cycle, dec!(10));
    assert_eq!(mug.suggested_capped, dec!(10));
    assert_eq!(mug.currency, "EUR");

    // 商品 2：以父商品上架日計算 50 天
    let bowl = row(2);
    assert_eq!(bowl.total_days, dec!(50));
    assert_eq!(bowl.demand_per_day, dec!(0.5));
    assert_eq!(bowl.stock_at_arrival, dec!(93));
    assert_eq!(bowl.suggested_raw, Decimal::ZERO);
    assert!(!bowl.needs_reorder());

    // 商品 4：匯入前 50 天 × 20% = 10 天缺貨
    let jug = row(4);
    assert_eq!(jug.legacy_stockout_days, dec!(10));
    assert_eq!(jug.stockout_days, dec!(10));
    assert_eq!(jug.qty_sold, dec!(90));
    assert_eq!(jug.demand_per_day, dec!(1));
    assert_eq!(jug.suggested_raw, dec!(30.4375));
    assert_eq!(jug.suggested_capped, dec!(30.4375));
}

#[rstest]
#[case(1, dec!(2), dec!(38.875), dec!(10))]
#[case(2, dec!(0.5), Decimal::ZERO, Decimal::ZERO)]
#[case(4, dec!(1), dec!(30.4375), dec!(30.4375))]
fn test_suggestion_per_product(
    #[case] product_id: EntityId,
    #[case] demand_per_day: Decimal,
    #[case] suggested_raw: Decimal,
    #[case] suggested_capped: Decimal,
) {
    let shop = shop();

    let rows = shop.engine.forecast_supplier(7);
    let row = rows.iter().find(|r| r.product_id == product_id).unwrap();

    assert_eq!(row.demand_per_day, demand_per_day);
    assert_eq!(row.suggested_raw, suggested_raw);
    assert_eq!(row.suggested_capped, suggested_capped);
    assert!(row.suggested_capped <= row.suggested_raw);
}

#[test]
fn test_processors_sort_and_annotate() {
    let shop = shop();
    let engine = shop
        .engine
        .with_processor(days_of_cover)
        .with_processor(sort_by_suggested);

    let rows = engine.forecast_supplier(7);
    let order: Vec<EntityId> = rows.iter().map(|r| r.product_id).collect();
    assert_eq!(order, vec![4, 1, 2]);

    assert_eq!(rows[0].extras["days_of_cover"], serde_json::json!("0.0"));
    assert_eq!(rows[1].extras["days_of_cover"], serde_json::json!("25.0"));
    assert_eq!(rows[2].extras["days_of_cover"], serde_json::json!("200.0"));

    let json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(json["extras"]["days_of_cover"], "0.0");
}

#[test]
fn test_open_stockout_counts_until_now() {
    let shop = shop();

    // 商品 4 三天前缺貨，至今未恢復
    shop.clock.set(days_ago(3));
    shop.engine
        .ledger()
        .record_stock_change(&StockChange::new(4, 0, Decimal::ZERO));
    shop.clock.set(window_end());

    let summary = shop.engine.summarizer().summarize(4, 100, as_of());
    assert_eq!(summary.live_stockout_days, dec!(3));
    assert_eq!(summary.stockout_days, dec!(13));
    assert_eq!(shop.engine.ledger().open_intervals(4, 0).len(), 1);
}

#[test]
fn test_forecast_many_suppliers() {
    let shop = shop();
    shop.store
        .insert_supplier(Supplier::new(8, "Empty".to_string(), 1, String::new()));

    let results = shop.engine.forecast_suppliers(&[7, 8, 404]);

    assert_eq!(results.len(), 3);
    assert_eq!(results[&7].len(), 3);
    assert!(results[&8].is_empty());
    assert!(results[&404].is_empty());
}

#[test]
fn test_unavailable_store_degrades() {
    let shop = shop();
    shop.store.set_unavailable(true);

    let report = shop.engine.forecast_supplier_report(7);
    assert!(report.rows.is_empty());
    assert!(report.policy.is_none());

    let summary = shop.engine.summarizer().summarize(1, 100, as_of());
    assert_eq!(summary.demand_per_day, Decimal::ZERO);
    assert_eq!(summary.days_on_sale, dec!(100));
}

#[test]
fn test_maintenance_prune_and_backfill() {
    let shop = shop();
    shop.store.insert_stock_item(StockItem::new(9, 0, Decimal::ZERO));

    assert_eq!(shop.engine.ledger().backfill_zero_stock(), 1);
    assert_eq!(shop.store.interval_count(), 2);

    // 六年後：全部超過 5 年保留期
    shop.clock.set(window_end() + Duration::days(6 * 366));
    assert_eq!(shop.engine.prune_stockouts(), 2);
    assert_eq!(shop.store.interval_count(), 0);
}

#[test]
fn test_config_from_json() {
    let config = ForecastConfig::from_json_str(
        r#"{
            "order_cycle_months": "3",
            "allowed_statuses": ["completed"],
            "default_currency": "USD"
        }"#,
    )
    .unwrap();

    assert_eq!(config.order_cycle_months, dec!(3));
    assert_eq!(config.allowed_statuses, vec![OrderStatus::Completed]);
    assert_eq!(config.retention_years, 5);

    let shop = shop();
    let engine = ForecastEngine::new(
        collaborators_from(shop.store.clone(), shop.clock.clone()),
        config,
    )
    .with_as_of(as_of());

    // Processing 訂單不再計入
    let rows = engine.forecast_supplier(7);
    let bowl = rows.iter().find(|r| r.product_id == 2).unwrap();
    assert_eq!(bowl.qty_sold, Decimal::ZERO);

    assert!(ForecastConfig::from_json_str(r#"{"allowed_statuses": []}"#).is_err());
}
