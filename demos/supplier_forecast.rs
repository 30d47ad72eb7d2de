//! 供應商補貨預測示例
//!
//! 執行：`RUST_LOG=debug cargo run --example supplier_forecast`

use anyhow::Context;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use replen::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== 供應商補貨預測示例 ===\n");

    let config = ForecastConfig::from_json_str(r#"{"order_cycle_months": "4"}"#)
        .context("無法載入預測配置")?;

    let as_of = NaiveDate::from_ymd_opt(2025, 10, 15).context("無效的分析日")?;
    let window_end = Utc
        .with_ymd_and_hms(2025, 10, 16, 0, 0, 0)
        .single()
        .context("無效的窗口終點")?;
    let clock = Arc::new(FixedClock::new(window_end));
    let store = Arc::new(MemoryStore::new());

    // 全域設定與供應商
    store.set_settings(GlobalSettings::new(Decimal::from(2), 180));
    store.insert_supplier(
        Supplier::new(1, "Harbour Pottery".to_string(), 4, "GBP".to_string())
            .with_holiday_extra_days(7),
    );

    // 商品與銷售紀錄
    let catalog = [
        (101, "MUG-BLUE", "Blue mug", 40, 540),
        (102, "MUG-RED", "Red mug", 5, 120),
        (103, "TEAPOT", "Teapot", 12, 0),
    ];
    for (id, sku, name, stock, sold) in catalog {
        store.insert_product(Product::new(
            id,
            sku.to_string(),
            name.to_string(),
            Decimal::from(stock),
        ));
        if sold > 0 {
            store.record_sale(
                id,
                window_end - Duration::days(15),
                Decimal::from(sold),
                OrderStatus::Completed,
            );
        }
    }
    store.set_meta(101, "max_order_qty_per_month", "60");
    store.assign_products(1, catalog.iter().map(|(id, ..)| *id).collect());

    let engine = ForecastEngine::new(collaborators_from(store.clone(), clock.clone()), config)
        .with_as_of(as_of)
        .with_processor(days_of_cover)
        .with_processor(sort_by_suggested);

    // 紅色馬克杯缺貨 30 天
    clock.set(window_end - Duration::days(60));
    engine
        .ledger()
        .record_stock_change(&StockChange::new(102, 0, Decimal::ZERO));
    clock.set(window_end - Duration::days(30));
    engine
        .ledger()
        .record_stock_change(&StockChange::new(102, 0, Decimal::from(5)));
    clock.set(window_end);

    let report = engine.forecast_supplier_report(1);
    tracing::info!(
        supplier_id = report.supplier_id,
        rows = report.rows.len(),
        "示例預測完成"
    );

    println!("建議訂購量:");
    for row in &report.rows {
        println!(
            "  - {} ({}): 每日需求 {:.2}, 到貨庫存 {:.1}, 建議 {:.1}{}",
            row.sku,
            row.name,
            row.demand_per_day,
            row.stock_at_arrival,
            row.suggested_capped,
            if row.is_capped() { " (已達月上限)" } else { "" }
        );
    }

    for warning in &report.warnings {
        println!("  ! {:?}: {}", warning.severity, warning.message);
    }

    println!(
        "\n{}",
        serde_json::to_string_pretty(&report.rows).context("無法序列化預測結果")?
    );

    Ok(())
}
