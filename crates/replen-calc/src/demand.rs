//! 需求速度計算

use chrono::{DateTime, NaiveDate, Utc};
use replen_core::window::{clamp_decimal, days_between};
use replen_core::{
    Catalog, DemandSummary, EntityId, OrderHistory, OrderStatus, Product, TimeWindow,
};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::StockoutLedger;

/// 需求摘要計算器
pub struct DemandSummarizer {
    catalog: Arc<dyn Catalog>,
    orders: Arc<dyn OrderHistory>,
    ledger: Arc<StockoutLedger>,
    allowed_statuses: Vec<OrderStatus>,
}

impl DemandSummarizer {
    /// 創建新的需求摘要計算器
    pub fn new(
        catalog: Arc<dyn Catalog>,
        orders: Arc<dyn OrderHistory>,
        ledger: Arc<StockoutLedger>,
        allowed_statuses: Vec<OrderStatus>,
    ) -> Self {
        Self {
            catalog,
            orders,
            ledger,
            allowed_statuses,
        }
    }

    /// 依商品ID計算需求摘要
    pub fn summarize(
        &self,
        product_id: EntityId,
        lookback_days: u32,
        as_of: NaiveDate,
    ) -> DemandSummary {
        let window = TimeWindow::lookback(as_of, lookback_days);
        if product_id == 0 {
            return DemandSummary::zeroed(product_id, window);
        }

        match self.catalog.get_product(product_id) {
            Ok(Some(product)) => self.summarize_product(&product, lookback_days, as_of),
            Ok(None) => self.summarize_window(product_id, None, window),
            Err(e) => {
                tracing::warn!("無法讀取商品 {}，視為無上架日期: {}", product_id, e);
                self.summarize_window(product_id, None, window)
            }
        }
    }

    /// 計算已載入商品的需求摘要
    pub fn summarize_product(
        &self,
        product: &Product,
        lookback_days: u32,
        as_of: NaiveDate,
    ) -> DemandSummary {
        let window = TimeWindow::lookback(as_of, lookback_days);
        if product.id == 0 {
            return DemandSummary::zeroed(product.id, window);
        }
        let created_at = self.resolve_created_at(product);
        self.summarize_window(product.id, created_at, window)
    }

    /// 上架時間（變體使用父商品的上架時間）
    fn resolve_created_at(&self, product: &Product) -> Option<DateTime<Utc>> {
        let parent_id = match product.parent_id {
            Some(parent_id) if parent_id > 0 => parent_id,
            _ => return product.created_at,
        };

        match self.catalog.get_product(parent_id) {
            Ok(Some(parent)) => parent.created_at.or(product.created_at),
            Ok(None) => product.created_at,
            Err(e) => {
                tracing::warn!("無法讀取父商品 {}: {}", parent_id, e);
                product.created_at
            }
        }
    }

    fn summarize_window(
        &self,
        product_id: EntityId,
        created_at: Option<DateTime<Utc>>,
        window: TimeWindow,
    ) -> DemandSummary {
        let (from, to) = (window.from, window.to);

        // Step 1: 窗口長度
        let window_span_days = window.span_days().max(Decimal::ONE);

        // Step 2: 扣除上架前的天數
        let total_days = match created_at {
            Some(created_at) => {
                let effective_start = from.max(created_at);
                window_span_days
                    .min(days_between(effective_start, to))
                    .max(Decimal::ONE)
            }
            None => window_span_days,
        };

        // Step 3: 銷量
        let qty_sold = match self.orders.sum_quantity_sold(
            product_id,
            from,
            to,
            &self.allowed_statuses,
        ) {
            Ok(qty) => qty.max(Decimal::ZERO),
            Err(e) => {
                tracing::warn!("無法讀取商品 {} 的銷量，視為 0: {}", product_id, e);
                Decimal::ZERO
            }
        };

        // Step 4-5: 即時與舊系統缺貨天數
        let live_stockout_days = self
            .ledger
            .days_in_window(product_id, 0, from, to)
            .max(Decimal::ZERO);
        let legacy = self.ledger.legacy_days_for_window(product_id, from, to);

        // Step 6: 合併缺貨天數
        let stockout_days = clamp_decimal(
            live_stockout_days + legacy.stockout_days,
            Decimal::ZERO,
            total_days,
        );

        // Step 7: 在售天數（最少 1）
        let days_on_sale = (total_days - stockout_days).max(Decimal::ONE);

        // Step 8: 每日需求
        let demand_per_day = if qty_sold > Decimal::ZERO {
            qty_sold / days_on_sale
        } else {
            Decimal::ZERO
        };

        tracing::debug!(
            "商品 {} 需求摘要: 銷量 {}, 在售 {} 天, 缺貨 {} 天, 每日需求 {}",
            product_id,
            qty_sold,
            days_on_sale,
            stockout_days,
            demand_per_day
        );

        DemandSummary {
            product_id,
            from_ts: from,
            to_ts: to,
            window_span_days,
            total_days,
            qty_sold,
            live_stockout_days,
            legacy_stockout_days: legacy.stockout_days,
            legacy_in_stock_days: legacy.in_stock_days,
            legacy_total_days: legacy.total_days,
            stockout_days,
            days_on_sale,
            demand_per_day,
        }
    }
}
