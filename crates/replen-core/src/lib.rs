//! # Replenishment Core
//!
//! 補貨預測的核心資料模型、配置、時間窗口與外部協作介面

pub mod clock;
pub mod config;
pub mod demand;
pub mod forecast;
pub mod product;
pub mod provider;
pub mod stockout;
pub mod supplier;
pub mod window;

// Re-export 主要類型
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ForecastConfig;
pub use demand::{DemandSummary, OrderStatus};
pub use forecast::ForecastRow;
pub use product::{Product, StockChange, StockItem, StockStatus};
pub use provider::{
    Catalog, LegacyHistory, OrderHistory, SettingsProvider, StockoutStore, SupplierRegistry,
};
pub use stockout::{LegacyHistoryRecord, LegacyWindowDays, StockoutInterval, StockoutSource};
pub use supplier::{GlobalSettings, Supplier, SupplierPolicy};
pub use window::TimeWindow;

/// 商品 / 變體 / 供應商 ID（0 為無效 ID）
pub type EntityId = u64;

/// 補貨計算錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum ReplenError {
    #[error("無效的輸入: {0}")]
    InvalidInput(String),

    #[error("找不到商品: {0}")]
    ProductNotFound(EntityId),

    #[error("找不到供應商: {0}")]
    SupplierNotFound(EntityId),

    #[error("外部資料來源不可用: {0}")]
    CollaboratorUnavailable(String),

    #[error("計算錯誤: {0}")]
    Computation(String),

    #[error("配置錯誤: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ReplenError>;
