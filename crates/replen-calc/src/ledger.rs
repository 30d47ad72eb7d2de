//! 缺貨帳本
//!
//! 合併兩種來源回答「商品在 `[from, to)` 內缺貨幾天」：
//! - 即時追蹤的缺貨區間（開啟中的區間以現在時間計算）
//! - 舊系統遷移前的彙總歷史（依缺貨比例估算匯入前的部分）

use chrono::{DateTime, Months, Utc};
use replen_core::window::{clamp_decimal, days_between};
use replen_core::{
    Catalog, Clock, EntityId, LegacyHistory, LegacyWindowDays, StockChange, StockoutInterval,
    StockoutSource, StockoutStore, TimeWindow,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// 庫存變動造成的區間轉換
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTransition {
    /// 開啟新區間
    Opened,
    /// 關閉既有區間
    Closed,
    /// 未管理庫存：開啟後立即關閉
    OpenedAndClosed,
    /// 無變化
    Unchanged,
}

/// 缺貨帳本
pub struct StockoutLedger {
    store: Arc<dyn StockoutStore>,
    legacy: Arc<dyn LegacyHistory>,
    catalog: Arc<dyn Catalog>,
    clock: Arc<dyn Clock>,
}

impl StockoutLedger {
    /// 創建新的缺貨帳本
    pub fn new(
        store: Arc<dyn StockoutStore>,
        legacy: Arc<dyn LegacyHistory>,
        catalog: Arc<dyn Catalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            legacy,
            catalog,
            clock,
        }
    }

    /// 開啟缺貨區間
    ///
    /// 已有開啟中的區間時不做任何事並回傳 None。
    pub fn open_interval(
        &self,
        product_id: EntityId,
        variation_id: EntityId,
        source: StockoutSource,
        note: &str,
    ) -> Option<Uuid> {
        if product_id == 0 {
            return None;
        }

        let interval = StockoutInterval::open(
            product_id,
            variation_id,
            self.clock.now(),
            source,
            note.to_string(),
        );

        match self.store.insert_if_none_open(interval) {
            Ok(Some(id)) => {
                tracing::debug!(
                    "開啟缺貨區間: 商品 {} 變體 {} ({})",
                    product_id,
                    variation_id,
                    source.as_str()
                );
                Some(id)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    "無法開啟缺貨區間: 商品 {} 變體 {}: {}",
                    product_id,
                    variation_id,
                    e
                );
                None
            }
        }
    }

    /// 關閉所有開啟中的缺貨區間，回傳關閉數量
    pub fn close_interval(
        &self,
        product_id: EntityId,
        variation_id: EntityId,
        source: StockoutSource,
        note: &str,
    ) -> usize {
        if product_id == 0 {
            return 0;
        }

        match self
            .store
            .close_open(product_id, variation_id, self.clock.now(), source, note)
        {
            Ok(closed) => {
                if closed > 0 {
                    tracing::debug!(
                        "關閉缺貨區間: 商品 {} 變體 {}，共 {} 筆",
                        product_id,
                        variation_id,
                        closed
                    );
                }
                closed
            }
            Err(e) => {
                tracing::warn!(
                    "無法關閉缺貨區間: 商品 {} 變體 {}: {}",
                    product_id,
                    variation_id,
                    e
                );
                0
            }
        }
    }

    /// 依庫存變動開啟或關閉區間
    pub fn record_stock_change(&self, change: &StockChange) -> StockTransition {
        if !change.manage_stock {
            // 未管理庫存：記錄一個零長度區間
            let opened = self
                .open_interval(
                    change.product_id,
                    change.variation_id,
                    StockoutSource::Unmanaged,
                    "stock management disabled",
                )
                .is_some();
            let closed = self.close_interval(
                change.product_id,
                change.variation_id,
                StockoutSource::Unmanaged,
                "stock management disabled",
            );
            return match (opened, closed > 0) {
                (true, _) => StockTransition::OpenedAndClosed,
                (false, true) => StockTransition::Closed,
                (false, false) => StockTransition::Unchanged,
            };
        }

        if change.is_out_of_stock() {
            let note = format!("stock {}", change.stock_quantity);
            return match self.open_interval(
                change.product_id,
                change.variation_id,
                StockoutSource::StockChange,
                &note,
            ) {
                Some(_) => StockTransition::Opened,
                None => StockTransition::Unchanged,
            };
        }

        if change.is_back_in_stock() {
            let note = format!("stock {}", change.stock_quantity);
            let closed = self.close_interval(
                change.product_id,
                change.variation_id,
                StockoutSource::StockChange,
                &note,
            );
            if closed > 0 {
                return StockTransition::Closed;
            }
        }

        StockTransition::Unchanged
    }

    /// 開啟中的缺貨區間
    pub fn open_intervals(
        &self,
        product_id: EntityId,
        variation_id: EntityId,
    ) -> Vec<StockoutInterval> {
        match self.store.has_open(product_id, variation_id) {
            Ok(true) => {}
            Ok(false) => return Vec::new(),
            Err(e) => {
                tracing::warn!("無法讀取缺貨區間: 商品 {}: {}", product_id, e);
                return Vec::new();
            }
        }

        match self.store.intervals_for(
            product_id,
            variation_id,
            DateTime::<Utc>::MIN_UTC,
            DateTime::<Utc>::MAX_UTC,
        ) {
            Ok(intervals) => intervals.into_iter().filter(|i| i.is_open()).collect(),
            Err(e) => {
                tracing::warn!("無法讀取缺貨區間: 商品 {}: {}", product_id, e);
                Vec::new()
            }
        }
    }

    /// 計算 `[from, to)` 內的即時缺貨天數
    ///
    /// 結果限制在 `[0, 窗口天數]`。
    pub fn days_in_window(
        &self,
        product_id: EntityId,
        variation_id: EntityId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Decimal {
        let window = TimeWindow::new(from, to);
        if product_id == 0 || window.is_empty() {
            return Decimal::ZERO;
        }

        let intervals = match self.store.intervals_for(product_id, variation_id, from, to) {
            Ok(intervals) => intervals,
            Err(e) => {
                tracing::warn!(
                    "無法讀取缺貨區間，視為無缺貨: 商品 {}: {}",
                    product_id,
                    e
                );
                return Decimal::ZERO;
            }
        };

        let now = self.clock.now();
        let total = intervals
            .iter()
            .map(|interval| window.overlap_days(interval.started_at, interval.effective_end(now)))
            .sum::<Decimal>();

        clamp_decimal(total, Decimal::ZERO, window.span_days())
    }

    /// 以舊系統歷史估算 `[from, to)` 內的缺貨天數
    ///
    /// 舊資料只適用於匯入之前的部分：
    /// `pre_import_days = 窗口天數 − 匯入至今天數`，限制在 `[0, 窗口天數]`；
    /// 若匯入時間早於窗口起點，則整個窗口都採用舊資料的比例。
    /// 「至今」取現在時間與窗口終點較早者，窗口終點是分析日的次日 00:00。
    pub fn legacy_days_for_window(
        &self,
        product_id: EntityId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> LegacyWindowDays {
        let window = TimeWindow::new(from, to);
        if product_id == 0 || window.is_empty() {
            return LegacyWindowDays::zero();
        }

        let record = match self.legacy.get_legacy_history(product_id) {
            Ok(Some(record)) => record,
            Ok(None) => return LegacyWindowDays::zero(),
            Err(e) => {
                tracing::warn!("無法讀取舊系統歷史: 商品 {}: {}", product_id, e);
                return LegacyWindowDays::zero();
            }
        };

        let ratio = match record.stockout_ratio() {
            Some(ratio) => clamp_decimal(ratio, Decimal::ZERO, Decimal::ONE),
            None => return LegacyWindowDays::zero(),
        };

        let lookback_days = window.span_days();
        let pre_import_days = if record.imported_at < from {
            lookback_days
        } else {
            let measured_at = self.clock.now().min(to);
            let days_since_import = days_between(record.imported_at, measured_at);
            clamp_decimal(lookback_days - days_since_import, Decimal::ZERO, lookback_days)
        };

        if pre_import_days <= Decimal::ZERO {
            return LegacyWindowDays::zero();
        }

        LegacyWindowDays {
            stockout_days: pre_import_days * ratio,
            in_stock_days: pre_import_days * (Decimal::ONE - ratio),
            total_days: pre_import_days,
        }
    }

    /// 刪除開始時間早於 `max_age_years` 年前的區間（最少保留 1 年）
    pub fn prune(&self, max_age_years: u32) -> usize {
        let years = max_age_years.max(1);
        let now = self.clock.now();
        let cutoff = match now.checked_sub_months(Months::new(years.saturating_mul(12))) {
            Some(cutoff) => cutoff,
            None => return 0,
        };

        match self.store.delete_started_before(cutoff) {
            Ok(deleted) => {
                tracing::info!("清除 {} 年前的缺貨區間: {} 筆", years, deleted);
                deleted
            }
            Err(e) => {
                tracing::warn!("清除缺貨區間失敗: {}", e);
                0
            }
        }
    }

    /// 為目前庫存 ≤ 0 且沒有開啟區間的商品 / 變體補登缺貨區間
    pub fn backfill_zero_stock(&self) -> usize {
        let items = match self.catalog.stock_managed_items() {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("無法讀取庫存清單，略過補登: {}", e);
                return 0;
            }
        };

        let mut opened = 0;
        for item in items.iter().filter(|item| item.is_depleted()) {
            if self
                .open_interval(
                    item.product_id,
                    item.variation_id,
                    StockoutSource::Backfill,
                    "zero stock backfill",
                )
                .is_some()
            {
                opened += 1;
            }
        }

        tracing::info!("補登缺貨區間: 檢查 {} 筆，新增 {} 筆", items.len(), opened);
        opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use replen_core::{FixedClock, LegacyHistoryRecord, StockItem};
    use replen_store::MemoryStore;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 16, 0, 0, 0).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, Arc<FixedClock>, StockoutLedger) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(now()));
        let ledger =
            StockoutLedger::new(store.clone(), store.clone(), store.clone(), clock.clone());
        (store, clock, ledger)
    }

    #[test]
    fn test_open_twice_keeps_single_interval() {
        let (_store, clock, ledger) = setup();

        assert!(ledger.open_interval(10, 0, StockoutSource::Manual, "").is_some());
        clock.advance(Duration::hours(1));
        assert!(ledger.open_interval(10, 0, StockoutSource::Manual, "").is_none());

        assert_eq!(ledger.open_intervals(10, 0).len(), 1);
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let (_store, _clock, ledger) = setup();
        assert_eq!(ledger.close_interval(10, 0, StockoutSource::Manual, ""), 0);
    }

    #[test]
    fn test_invalid_product_id() {
        let (_store, _clock, ledger) = setup();
        assert!(ledger.open_interval(0, 0, StockoutSource::Manual, "").is_none());
        assert_eq!(ledger.days_in_window(0, 0, now() - Duration::days(5), now()), Decimal::ZERO);
    }

    #[test]
    fn test_days_in_window_closed_and_open() {
        let (_store, clock, ledger) = setup();
        let from = now() - Duration::days(30);

        // 缺貨 4 天後補貨
        clock.set(now() - Duration::days(20));
        ledger.open_interval(10, 0, StockoutSource::StockChange, "");
        clock.set(now() - Duration::days(16));
        assert_eq!(ledger.close_interval(10, 0, StockoutSource::StockChange, "restock"), 1);

        // 再次缺貨，至今未恢復（2 天）
        clock.set(now() - Duration::days(2));
        ledger.open_interval(10, 0, StockoutSource::StockChange, "");
        clock.set(now());

        assert_eq!(ledger.days_in_window(10, 0, from, now()), dec!(6));
        // 開啟中的區間不會被寫回結束時間
        assert_eq!(ledger.open_intervals(10, 0).len(), 1);
    }

    #[test]
    fn test_days_in_window_clipped_to_window() {
        let (_store, clock, ledger) = setup();

        clock.set(now() - Duration::days(100));
        ledger.open_interval(11, 0, StockoutSource::StockChange, "");
        clock.set(now());

        let from = now() - Duration::days(10);
        assert_eq!(ledger.days_in_window(11, 0, from, now()), dec!(10));
        assert_eq!(ledger.days_in_window(11, 0, now(), from), Decimal::ZERO);
    }

    #[test]
    fn test_variations_are_independent() {
        let (_store, clock, ledger) = setup();

        clock.set(now() - Duration::days(3));
        ledger.open_interval(12, 5, StockoutSource::StockChange, "");
        clock.set(now());

        let from = now() - Duration::days(30);
        assert_eq!(ledger.days_in_window(12, 5, from, now()), dec!(3));
        assert_eq!(ledger.days_in_window(12, 0, from, now()), Decimal::ZERO);
    }

    #[test]
    fn test_legacy_days_scenario() {
        let (store, _clock, ledger) = setup();
        store.insert_legacy(LegacyHistoryRecord::new(
            20,
            dec!(60),
            dec!(240),
            now() - Duration::days(100),
        ));

        let days = ledger.legacy_days_for_window(20, now() - Duration::days(365), now());

        assert_eq!(days.total_days, dec!(265));
        assert_eq!(days.stockout_days, dec!(53));
        assert_eq!(days.in_stock_days, dec!(212));
    }

    #[test]
    fn test_legacy_days_measured_to_now_within_day() {
        let (store, clock, ledger) = setup();
        // 分析日 10:00，窗口終點為次日 00:00
        let ten_am = now() - Duration::hours(14);
        clock.set(ten_am);
        store.insert_legacy(LegacyHistoryRecord::new(
            24,
            dec!(60),
            dec!(240),
            ten_am - Duration::days(100),
        ));

        let days = ledger.legacy_days_for_window(24, now() - Duration::days(365), now());

        assert_eq!(days.total_days, dec!(265));
        assert_eq!(days.stockout_days, dec!(53));
    }

    #[test]
    fn test_open_intervals_skips_closed_keys() {
        let (store, _clock, ledger) = setup();

        ledger.open_interval(25, 0, StockoutSource::Manual, "");
        ledger.close_interval(25, 0, StockoutSource::Manual, "");
        assert!(ledger.open_intervals(25, 0).is_empty());
        assert_eq!(store.interval_count(), 1);

        ledger.open_interval(25, 0, StockoutSource::Manual, "");
        assert_eq!(ledger.open_intervals(25, 0).len(), 1);

        store.set_unavailable(true);
        assert!(ledger.open_intervals(25, 0).is_empty());
    }

    #[test]
    fn test_legacy_imported_before_window_uses_full_span() {
        let (store, _clock, ledger) = setup();
        store.insert_legacy(LegacyHistoryRecord::new(
            21,
            dec!(10),
            dec!(90),
            now() - Duration::days(400),
        ));

        let days = ledger.legacy_days_for_window(21, now() - Duration::days(100), now());
        assert_eq!(days.total_days, dec!(100));
        assert_eq!(days.stockout_days, dec!(10));
    }

    #[test]
    fn test_legacy_zero_cases() {
        let (store, _clock, ledger) = setup();
        store.insert_legacy(LegacyHistoryRecord::new(22, dec!(0), dec!(0), now()));

        let from = now() - Duration::days(30);
        // 分母為 0
        assert!(ledger.legacy_days_for_window(22, from, now()).is_zero());
        // 無紀錄
        assert!(ledger.legacy_days_for_window(23, from, now()).is_zero());
        // 空窗口
        assert!(ledger.legacy_days_for_window(22, now(), from).is_zero());
    }

    #[test]
    fn test_record_stock_change_lifecycle() {
        let (_store, clock, ledger) = setup();

        let out = StockChange::new(30, 0, Decimal::ZERO);
        assert_eq!(ledger.record_stock_change(&out), StockTransition::Opened);
        assert_eq!(ledger.record_stock_change(&out), StockTransition::Unchanged);

        clock.advance(Duration::days(2));
        let back = StockChange::new(30, 0, dec!(8));
        assert_eq!(ledger.record_stock_change(&back), StockTransition::Closed);
        assert_eq!(ledger.record_stock_change(&back), StockTransition::Unchanged);

        let unmanaged = StockChange::new(31, 0, dec!(8)).unmanaged();
        assert_eq!(
            ledger.record_stock_change(&unmanaged),
            StockTransition::OpenedAndClosed
        );
        assert!(ledger.open_intervals(31, 0).is_empty());
    }

    #[test]
    fn test_prune_enforces_minimum_one_year() {
        let (store, clock, ledger) = setup();

        clock.set(now() - Duration::days(800));
        ledger.open_interval(40, 0, StockoutSource::Manual, "");
        ledger.close_interval(40, 0, StockoutSource::Manual, "");
        clock.set(now() - Duration::days(200));
        ledger.open_interval(41, 0, StockoutSource::Manual, "");
        clock.set(now());

        assert_eq!(ledger.prune(5), 0);
        // 0 年視為 1 年
        assert_eq!(ledger.prune(0), 1);
        assert_eq!(store.interval_count(), 1);
    }

    #[test]
    fn test_backfill_zero_stock() {
        let (store, _clock, ledger) = setup();
        store.insert_stock_item(StockItem::new(50, 0, Decimal::ZERO));
        store.insert_stock_item(StockItem::new(51, 7, dec!(-2)));
        store.insert_stock_item(StockItem::new(52, 0, dec!(5)));

        // 50 已有開啟中的區間
        ledger.open_interval(50, 0, StockoutSource::StockChange, "");

        assert_eq!(ledger.backfill_zero_stock(), 1);
        let opened = ledger.open_intervals(51, 7);
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].source, StockoutSource::Backfill);
        assert!(ledger.open_intervals(52, 0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_days_in_window_within_bounds(
            start_offset in 0i64..2000,
            length in 0i64..2000,
            window_start in 0i64..1000,
            window_len in -50i64..1000,
        ) {
            let (_store, clock, ledger) = setup();
            let base = now() - Duration::days(1500);

            clock.set(base + Duration::hours(start_offset));
            ledger.open_interval(60, 0, StockoutSource::Manual, "");
            clock.set(base + Duration::hours(start_offset + length));
            ledger.close_interval(60, 0, StockoutSource::Manual, "");
            clock.set(now());

            let from = base + Duration::hours(window_start);
            let to = from + Duration::hours(window_len);
            let days = ledger.days_in_window(60, 0, from, to);

            prop_assert!(days >= Decimal::ZERO);
            if from >= to {
                prop_assert_eq!(days, Decimal::ZERO);
            } else {
                prop_assert!(days <= TimeWindow::new(from, to).span_days());
            }
        }
    }
}
