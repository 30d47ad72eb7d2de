//! # Replen
//!
//! 供應商補貨預測：缺貨帳本、需求速度與建議訂購量
//!
//! ```
//! use std::sync::Arc;
//! use replen::{ForecastConfig, ForecastEngine, MemoryStore, SystemClock};
//!
//! let store = Arc::new(MemoryStore::new());
//! let engine = ForecastEngine::new(
//!     replen::collaborators_from(store, Arc::new(SystemClock)),
//!     ForecastConfig::default(),
//! );
//! assert!(engine.forecast_supplier(1).is_empty());
//! ```

use std::sync::Arc;

pub use replen_calc::{
    Collaborators, DemandSummarizer, ForecastEngine, ForecastReport, ForecastWarning,
    MonthlyCapResolver, RowPipeline, RowProcessor, StockTransition, StockoutLedger,
    SupplierPolicyResolver, WarningSeverity,
};
pub use replen_calc::pipeline::{days_of_cover, sort_by_suggested};
pub use replen_core::*;
pub use replen_store::MemoryStore;

/// 以單一資料來源建立協作者集合
pub fn collaborators_from<S>(store: Arc<S>, clock: Arc<dyn Clock>) -> Collaborators
where
    S: Catalog
        + SupplierRegistry
        + SettingsProvider
        + OrderHistory
        + LegacyHistory
        + StockoutStore
        + 'static,
{
    Collaborators {
        catalog: store.clone(),
        suppliers: store.clone(),
        settings: store.clone(),
        orders: store.clone(),
        legacy: store.clone(),
        stockouts: store,
        clock,
    }
}
