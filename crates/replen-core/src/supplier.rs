//! 供應商與補貨政策模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// 供應商（唯讀，來自供應商登記）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    /// 供應商ID
    pub id: EntityId,

    /// 名稱
    pub name: String,

    /// 交期（週）
    pub lead_time_weeks: u32,

    /// 假期額外天數（如農曆新年停工）
    #[serde(default)]
    pub holiday_extra_days: u32,

    /// 幣別
    pub currency: String,

    /// 緩衝月數覆寫（None 表示使用全域設定）
    #[serde(default)]
    pub buffer_months_override: Option<Decimal>,
}

impl Supplier {
    /// 創建新的供應商
    pub fn new(id: EntityId, name: String, lead_time_weeks: u32, currency: String) -> Self {
        Self {
            id,
            name,
            lead_time_weeks,
            holiday_extra_days: 0,
            currency,
            buffer_months_override: None,
        }
    }

    /// 建構器模式：設置緩衝月數覆寫
    pub fn with_buffer_months(mut self, months: Decimal) -> Self {
        self.buffer_months_override = Some(months);
        self
    }

    /// 建構器模式：設置假期額外天數
    pub fn with_holiday_extra_days(mut self, days: u32) -> Self {
        self.holiday_extra_days = days;
        self
    }
}

/// 全域設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// 全域緩衝月數
    pub buffer_months_global: Decimal,

    /// 預設分析回溯天數
    pub analysis_lookback_days: u32,
}

impl GlobalSettings {
    pub fn new(buffer_months_global: Decimal, analysis_lookback_days: u32) -> Self {
        Self {
            buffer_months_global,
            analysis_lookback_days,
        }
        .normalized()
    }

    /// 修正不合法的值（緩衝月數 ≥ 0，回溯天數 ≥ 1）
    pub fn normalized(mut self) -> Self {
        self.buffer_months_global = self.buffer_months_global.max(Decimal::ZERO);
        self.analysis_lookback_days = self.analysis_lookback_days.max(1);
        self
    }
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            buffer_months_global: Decimal::ZERO,
            analysis_lookback_days: 365,
        }
    }
}

/// 解析後的供應商補貨政策
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierPolicy {
    pub supplier_id: EntityId,
    pub lead_time_weeks: u32,
    pub buffer_months: Decimal,
    pub holiday_extra_days: u32,
    pub lookback_days: u32,
    pub currency: String,
    /// 是否找到供應商（false 時為歸零政策）
    pub found: bool,
}

impl SupplierPolicy {
    /// 歸零政策（找不到供應商時使用）
    pub fn zeroed(supplier_id: EntityId, lookback_days: u32, currency: String) -> Self {
        Self {
            supplier_id,
            lead_time_weeks: 0,
            buffer_months: Decimal::ZERO,
            holiday_extra_days: 0,
            lookback_days: lookback_days.max(1),
            currency,
            found: false,
        }
    }

    /// 交期天數 = 週數 × 7 + 假期額外天數
    pub fn lead_days(&self) -> Decimal {
        Decimal::from(self.lead_time_weeks) * Decimal::from(7)
            + Decimal::from(self.holiday_extra_days)
    }
}
