//! 需求摘要模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EntityId, TimeWindow};

/// 訂單狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    Processing,
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    /// 計入銷量的預設狀態
    pub const COUNTED: [OrderStatus; 3] = [
        OrderStatus::Processing,
        OrderStatus::Completed,
        OrderStatus::OnHold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::OnHold => "on-hold",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Failed => "failed",
        }
    }
}

/// 單一商品在回溯窗口內的需求摘要
///
/// 保留所有中間值，方便除錯與報表顯示。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSummary {
    pub product_id: EntityId,

    /// 窗口起點（含）
    pub from_ts: DateTime<Utc>,

    /// 窗口終點（不含）
    pub to_ts: DateTime<Utc>,

    /// 窗口長度（天，最少 1）
    pub window_span_days: Decimal,

    /// 商品實際存在的天數（扣除上架前，最少 1）
    pub total_days: Decimal,

    /// 銷售數量
    pub qty_sold: Decimal,

    /// 即時追蹤的缺貨天數
    pub live_stockout_days: Decimal,

    /// 舊系統估算缺貨天數
    pub legacy_stockout_days: Decimal,

    /// 舊系統估算在售天數
    pub legacy_in_stock_days: Decimal,

    /// 舊系統涵蓋天數
    pub legacy_total_days: Decimal,

    /// 合併缺貨天數（限制在 [0, total_days]）
    pub stockout_days: Decimal,

    /// 在售天數（最少 1，避免除以零）
    pub days_on_sale: Decimal,

    /// 每日需求
    pub demand_per_day: Decimal,
}

impl DemandSummary {
    /// 歸零摘要（無效商品時使用）
    pub fn zeroed(product_id: EntityId, window: TimeWindow) -> Self {
        let span = window.span_days().max(Decimal::ONE);
        Self {
            product_id,
            from_ts: window.from,
            to_ts: window.to,
            window_span_days: span,
            total_days: span,
            qty_sold: Decimal::ZERO,
            live_stockout_days: Decimal::ZERO,
            legacy_stockout_days: Decimal::ZERO,
            legacy_in_stock_days: Decimal::ZERO,
            legacy_total_days: Decimal::ZERO,
            stockout_days: Decimal::ZERO,
            days_on_sale: Decimal::ONE,
            demand_per_day: Decimal::ZERO,
        }
    }

    /// 是否有銷售
    pub fn has_sales(&self) -> bool {
        self.qty_sold > Decimal::ZERO
    }
}
