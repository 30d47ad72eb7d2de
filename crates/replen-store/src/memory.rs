//! 記憶體資料來源

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use replen_core::{
    Catalog, EntityId, GlobalSettings, LegacyHistory, LegacyHistoryRecord, OrderHistory,
    OrderStatus, Product, ReplenError, SettingsProvider, StockItem, StockoutInterval,
    StockoutSource, StockoutStore, Supplier, SupplierRegistry,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

/// 訂單明細
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub product_id: EntityId,
    pub sold_at: DateTime<Utc>,
    pub quantity: Decimal,
    pub status: OrderStatus,
}

#[derive(Default)]
struct State {
    products: HashMap<EntityId, Product>,
    meta: HashMap<(EntityId, String), String>,
    stock_items: Vec<StockItem>,
    suppliers: HashMap<EntityId, Supplier>,
    assignments: HashMap<EntityId, Vec<EntityId>>,
    settings: GlobalSettings,
    sales: Vec<SaleLine>,
    legacy: HashMap<EntityId, LegacyHistoryRecord>,
    intervals: Vec<StockoutInterval>,
}

/// 記憶體資料來源
///
/// 同時實作所有協作介面，所有狀態由單一鎖保護，
/// 因此 `insert_if_none_open` 的檢查與寫入是原子操作。
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// 創建空的資料來源
    pub fn new() -> Self {
        Self::default()
    }

    /// 模擬資料來源離線（所有介面回傳錯誤）
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> replen_core::Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ReplenError::CollaboratorUnavailable(
                "memory store offline".to_string(),
            ));
        }
        Ok(())
    }

    pub fn insert_product(&self, product: Product) {
        self.state.lock().products.insert(product.id, product);
    }

    /// 設置商品自訂欄位
    pub fn set_meta(&self, product_id: EntityId, key: &str, value: &str) {
        self.state
            .lock()
            .meta
            .insert((product_id, key.to_string()), value.to_string());
    }

    pub fn insert_stock_item(&self, item: StockItem) {
        self.state.lock().stock_items.push(item);
    }

    pub fn insert_supplier(&self, supplier: Supplier) {
        self.state.lock().suppliers.insert(supplier.id, supplier);
    }

    /// 指派商品給供應商（取代既有指派）
    pub fn assign_products(&self, supplier_id: EntityId, product_ids: Vec<EntityId>) {
        self.state.lock().assignments.insert(supplier_id, product_ids);
    }

    pub fn set_settings(&self, settings: GlobalSettings) {
        self.state.lock().settings = settings;
    }

    /// 記錄一筆銷售
    pub fn record_sale(
        &self,
        product_id: EntityId,
        sold_at: DateTime<Utc>,
        quantity: Decimal,
        status: OrderStatus,
    ) {
        self.state.lock().sales.push(SaleLine {
            product_id,
            sold_at,
            quantity,
            status,
        });
    }

    pub fn insert_legacy(&self, record: LegacyHistoryRecord) {
        self.state.lock().legacy.insert(record.product_id, record);
    }

    /// 缺貨區間總數
    pub fn interval_count(&self) -> usize {
        self.state.lock().intervals.len()
    }

    /// 所有缺貨區間的快照
    pub fn intervals(&self) -> Vec<StockoutInterval> {
        self.state.lock().intervals.clone()
    }
}

impl Catalog for MemoryStore {
    fn get_product(&self, product_id: EntityId) -> replen_core::Result<Option<Product>> {
        self.check_available()?;
        Ok(self.state.lock().products.get(&product_id).cloned())
    }

    fn get_meta(&self, product_id: EntityId, key: &str) -> replen_core::Result<Option<String>> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .meta
            .get(&(product_id, key.to_string()))
            .cloned())
    }

    fn stock_managed_items(&self) -> replen_core::Result<Vec<StockItem>> {
        self.check_available()?;
        Ok(self.state.lock().stock_items.clone())
    }
}

impl SupplierRegistry for MemoryStore {
    fn get_supplier(&self, supplier_id: EntityId) -> replen_core::Result<Option<Supplier>> {
        self.check_available()?;
        Ok(self.state.lock().suppliers.get(&supplier_id).cloned())
    }

    fn get_products_for_supplier(
        &self,
        supplier_id: EntityId,
    ) -> replen_core::Result<Vec<EntityId>> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .assignments
            .get(&supplier_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl SettingsProvider for MemoryStore {
    fn get_global_settings(&self) -> replen_core::Result<GlobalSettings> {
        self.check_available()?;
        Ok(self.state.lock().settings.clone())
    }
}

impl OrderHistory for MemoryStore {
    fn sum_quantity_sold(
        &self,
        product_id: EntityId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        allowed_statuses: &[OrderStatus],
    ) -> replen_core::Result<Decimal> {
        self.check_available()?;
        let state = self.state.lock();

        state
            .sales
            .iter()
            .filter(|line| line.product_id == product_id)
            .filter(|line| line.sold_at >= from && line.sold_at < to)
            .filter(|line| allowed_statuses.contains(&line.status))
            .try_fold(Decimal::ZERO, |total, line| {
                total.checked_add(line.quantity).ok_or_else(|| {
                    ReplenError::Computation(format!("商品 {} 銷量加總溢位", product_id))
                })
            })
    }
}

impl LegacyHistory for MemoryStore {
    fn get_legacy_history(
        &self,
        product_id: EntityId,
    ) -> replen_core::Result<Option<LegacyHistoryRecord>> {
        self.check_available()?;
        Ok(self.state.lock().legacy.get(&product_id).cloned())
    }
}

impl StockoutStore for MemoryStore {
    fn insert_if_none_open(&self, interval: StockoutInterval) -> replen_core::Result<Option<Uuid>> {
        self.check_available()?;
        let mut state = self.state.lock();

        let already_open = state.intervals.iter().any(|existing| {
            existing.product_id == interval.product_id
                && existing.variation_id == interval.variation_id
                && existing.is_open()
        });
        if already_open {
            return Ok(None);
        }

        let id = interval.id;
        state.intervals.push(interval);
        Ok(Some(id))
    }

    fn close_open(
        &self,
        product_id: EntityId,
        variation_id: EntityId,
        ended_at: DateTime<Utc>,
        source: StockoutSource,
        note: &str,
    ) -> replen_core::Result<usize> {
        self.check_available()?;
        let mut state = self.state.lock();

        let mut closed = 0;
        for interval in state.intervals.iter_mut().filter(|i| {
            i.product_id == product_id && i.variation_id == variation_id && i.is_open()
        }) {
            interval.close(ended_at, source, note);
            closed += 1;
        }
        Ok(closed)
    }

    fn intervals_for(
        &self,
        product_id: EntityId,
        variation_id: EntityId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> replen_core::Result<Vec<StockoutInterval>> {
        self.check_available()?;
        let state = self.state.lock();

        Ok(state
            .intervals
            .iter()
            .filter(|i| i.product_id == product_id && i.variation_id == variation_id)
            .filter(|i| i.started_at < to && i.ended_at.map_or(true, |end| end > from))
            .cloned()
            .collect())
    }

    fn has_open(&self, product_id: EntityId, variation_id: EntityId) -> replen_core::Result<bool> {
        self.check_available()?;
        Ok(self.state.lock().intervals.iter().any(|i| {
            i.product_id == product_id && i.variation_id == variation_id && i.is_open()
        }))
    }

    fn delete_started_before(&self, cutoff: DateTime<Utc>) -> replen_core::Result<usize> {
        self.check_available()?;
        let mut state = self.state.lock();

        let before = state.intervals.len();
        state.intervals.retain(|i| i.started_at >= cutoff);
        let deleted = before - state.intervals.len();
        if deleted > 0 {
            tracing::debug!("刪除 {} 筆缺貨區間（開始早於 {}）", deleted, cutoff);
        }
        Ok(deleted)
    }
}
