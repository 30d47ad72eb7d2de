//! 缺貨區間與舊系統歷史模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EntityId;

/// 缺貨區間來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockoutSource {
    /// 庫存變動事件
    StockChange,
    /// 未啟用庫存管理（立即關閉）
    Unmanaged,
    /// 維護補登
    Backfill,
    /// 手動操作
    Manual,
}

impl StockoutSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockoutSource::StockChange => "stock_change",
            StockoutSource::Unmanaged => "unmanaged",
            StockoutSource::Backfill => "backfill",
            StockoutSource::Manual => "manual",
        }
    }
}

/// 缺貨區間
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockoutInterval {
    /// 區間ID
    pub id: Uuid,

    /// 商品ID
    pub product_id: EntityId,

    /// 變體ID（0 表示商品本身）
    pub variation_id: EntityId,

    /// 開始時間
    pub started_at: DateTime<Utc>,

    /// 結束時間（None 表示仍在缺貨）
    pub ended_at: Option<DateTime<Utc>>,

    /// 開啟來源
    pub source: StockoutSource,

    /// 備註
    pub note: String,
}

impl StockoutInterval {
    /// 創建新的開啟區間
    pub fn open(
        product_id: EntityId,
        variation_id: EntityId,
        started_at: DateTime<Utc>,
        source: StockoutSource,
        note: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            variation_id,
            started_at,
            ended_at: None,
            source,
            note,
        }
    }

    /// 是否仍在缺貨
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// 關閉區間並附加備註
    pub fn close(&mut self, ended_at: DateTime<Utc>, source: StockoutSource, note: &str) {
        self.ended_at = Some(ended_at.max(self.started_at));
        let suffix = if note.is_empty() {
            format!("closed:{}", source.as_str())
        } else {
            format!("closed:{} {}", source.as_str(), note)
        };
        if self.note.is_empty() {
            self.note = suffix;
        } else {
            self.note = format!("{} | {}", self.note, suffix);
        }
    }

    /// 有效結束時間（開啟中的區間以 `now` 計算，不寫回）
    pub fn effective_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.ended_at.unwrap_or(now)
    }
}

/// 舊系統遷移前的缺貨歷史（每個商品一筆，唯讀）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyHistoryRecord {
    pub product_id: EntityId,
    pub stockout_days: Decimal,
    pub on_sale_days: Decimal,
    pub imported_at: DateTime<Utc>,
}

impl LegacyHistoryRecord {
    pub fn new(
        product_id: EntityId,
        stockout_days: Decimal,
        on_sale_days: Decimal,
        imported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            product_id,
            stockout_days,
            on_sale_days,
            imported_at,
        }
    }

    /// 缺貨比例 = 缺貨天數 / (缺貨天數 + 在售天數)，分母 ≤ 0 時為 None
    pub fn stockout_ratio(&self) -> Option<Decimal> {
        let denominator = self.stockout_days + self.on_sale_days;
        if denominator <= Decimal::ZERO {
            return None;
        }
        Some(self.stockout_days / denominator)
    }
}

/// 舊系統歷史在窗口中的估算天數
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyWindowDays {
    pub stockout_days: Decimal,
    pub in_stock_days: Decimal,
    pub total_days: Decimal,
}

impl LegacyWindowDays {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.total_days.is_zero()
    }
}
