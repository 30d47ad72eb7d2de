//! 外部協作介面
//!
//! 預測核心只透過這些 trait 存取商品目錄、訂單歷史、供應商登記與設定。
//! 回傳 `Err` 代表資料來源不可用，呼叫端會降級為「無資料」處理。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    EntityId, GlobalSettings, LegacyHistoryRecord, OrderStatus, Product, StockItem,
    StockoutInterval, StockoutSource, Supplier,
};

/// 商品目錄
pub trait Catalog: Send + Sync {
    /// 讀取商品（找不到時為 None）
    fn get_product(&self, product_id: EntityId) -> crate::Result<Option<Product>>;

    /// 讀取商品自訂欄位
    fn get_meta(&self, product_id: EntityId, key: &str) -> crate::Result<Option<String>>;

    /// 所有啟用庫存管理的商品 / 變體
    fn stock_managed_items(&self) -> crate::Result<Vec<StockItem>>;
}

/// 供應商登記
pub trait SupplierRegistry: Send + Sync {
    fn get_supplier(&self, supplier_id: EntityId) -> crate::Result<Option<Supplier>>;

    /// 指派給供應商的商品ID
    fn get_products_for_supplier(&self, supplier_id: EntityId) -> crate::Result<Vec<EntityId>>;
}

/// 全域設定
pub trait SettingsProvider: Send + Sync {
    fn get_global_settings(&self) -> crate::Result<GlobalSettings>;
}

/// 訂單歷史
pub trait OrderHistory: Send + Sync {
    /// 統計 `[from, to)` 內指定狀態訂單的銷售數量
    fn sum_quantity_sold(
        &self,
        product_id: EntityId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        allowed_statuses: &[OrderStatus],
    ) -> crate::Result<Decimal>;
}

/// 舊系統缺貨歷史
pub trait LegacyHistory: Send + Sync {
    fn get_legacy_history(&self, product_id: EntityId)
        -> crate::Result<Option<LegacyHistoryRecord>>;
}

/// 缺貨區間儲存
///
/// 實作必須讓 `insert_if_none_open` 與 `close_open` 對同一 (商品, 變體)
/// 互斥執行，確保同時最多只有一個開啟中的區間。
pub trait StockoutStore: Send + Sync {
    /// 若無開啟中的區間則新增，回傳新區間ID；已有開啟區間時回傳 None
    fn insert_if_none_open(&self, interval: StockoutInterval) -> crate::Result<Option<Uuid>>;

    /// 關閉所有開啟中的區間，回傳關閉數量
    fn close_open(
        &self,
        product_id: EntityId,
        variation_id: EntityId,
        ended_at: DateTime<Utc>,
        source: StockoutSource,
        note: &str,
    ) -> crate::Result<usize>;

    /// 讀取與 `[from, to)` 可能重疊的區間（開始時間早於 `to`）
    fn intervals_for(
        &self,
        product_id: EntityId,
        variation_id: EntityId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> crate::Result<Vec<StockoutInterval>>;

    /// 是否有開啟中的區間
    fn has_open(&self, product_id: EntityId, variation_id: EntityId) -> crate::Result<bool>;

    /// 刪除開始時間早於 `cutoff` 的區間，回傳刪除數量
    fn delete_started_before(&self, cutoff: DateTime<Utc>) -> crate::Result<usize>;
}
