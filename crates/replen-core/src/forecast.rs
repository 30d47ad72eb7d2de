//! 預測結果模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::EntityId;

/// 單一商品的補貨預測（每次計算重新產生，不寫回）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub product_id: EntityId,
    pub supplier_id: EntityId,
    pub sku: String,
    pub name: String,
    pub currency: String,

    /// 現有庫存（≥ 0）
    pub current_stock: Decimal,

    /// 回溯窗口銷量
    pub qty_sold: Decimal,

    /// 每日需求
    pub demand_per_day: Decimal,

    /// 交期天數
    pub lead_days: Decimal,

    /// 緩衝天數
    pub buffer_days: Decimal,

    /// 預測天數 = 交期 + 緩衝
    pub forecast_days: Decimal,

    /// 預測需求（僅供參考）
    pub forecast_demand: Decimal,

    /// 交期內需求
    pub lead_demand: Decimal,

    /// 交期內需求（舊欄位名稱，與 lead_demand 相同）
    pub demand_during_lead: Decimal,

    /// 緩衝期需求
    pub buffer_demand: Decimal,

    /// 在途數量（目前固定為 0）
    pub inbound_qty: Decimal,

    /// 到貨時預計庫存（≥ 0）
    pub stock_at_arrival: Decimal,

    /// 到貨時目標庫存
    pub buffer_target: Decimal,

    /// 建議訂購量（未限量）
    pub suggested_raw: Decimal,

    /// 建議訂購量（套用月上限後）
    pub suggested_capped: Decimal,

    /// 每月訂購上限（0 表示不限）
    pub max_per_month: Decimal,

    /// 有效訂購週期（月）
    pub effective_cycle_months: Decimal,

    /// 本週期上限（0 表示不限）
    pub max_for_cycle: Decimal,

    pub total_days: Decimal,
    pub days_on_sale: Decimal,
    pub stockout_days: Decimal,
    pub live_stockout_days: Decimal,
    pub legacy_stockout_days: Decimal,

    /// 後處理附加欄位
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl ForecastRow {
    /// 是否被月上限截斷
    pub fn is_capped(&self) -> bool {
        self.suggested_capped < self.suggested_raw
    }

    /// 是否需要補貨
    pub fn needs_reorder(&self) -> bool {
        self.suggested_capped > Decimal::ZERO
    }

    /// 附加欄位
    pub fn set_extra(&mut self, key: &str, value: serde_json::Value) {
        self.extras.insert(key.to_string(), value);
    }

    /// 覆蓋天數 = 現有庫存 / 每日需求（無需求時為 None）
    pub fn days_of_cover(&self) -> Option<Decimal> {
        if self.demand_per_day <= Decimal::ZERO {
            return None;
        }
        Some(self.current_stock / self.demand_per_day)
    }
}
