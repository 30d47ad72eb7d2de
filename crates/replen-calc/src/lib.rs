//! # Replenishment Calculation Engine
//!
//! 缺貨天數、需求速度與建議訂購量的計算引擎

use std::sync::Arc;

use replen_core::{
    Catalog, Clock, EntityId, LegacyHistory, OrderHistory, SettingsProvider, StockoutStore,
    SupplierPolicy, SupplierRegistry,
};

pub mod cap;
pub mod demand;
pub mod forecast;
pub mod ledger;
pub mod pipeline;
pub mod policy;

// Re-export 主要類型
pub use cap::MonthlyCapResolver;
pub use demand::DemandSummarizer;
pub use forecast::ForecastEngine;
pub use ledger::{StockTransition, StockoutLedger};
pub use pipeline::{RowPipeline, RowProcessor};
pub use policy::SupplierPolicyResolver;

/// 外部協作者集合
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub suppliers: Arc<dyn SupplierRegistry>,
    pub settings: Arc<dyn SettingsProvider>,
    pub orders: Arc<dyn OrderHistory>,
    pub legacy: Arc<dyn LegacyHistory>,
    pub stockouts: Arc<dyn StockoutStore>,
    pub clock: Arc<dyn Clock>,
}

/// 供應商預測結果
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub supplier_id: EntityId,

    /// 解析後的政策（供應商無效時為 None）
    pub policy: Option<SupplierPolicy>,

    /// 預測列
    pub rows: Vec<replen_core::ForecastRow>,

    /// 警告信息
    pub warnings: Vec<ForecastWarning>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl ForecastReport {
    /// 創建空的預測結果
    pub fn empty(supplier_id: EntityId) -> Self {
        Self {
            supplier_id,
            policy: None,
            rows: Vec::new(),
            warnings: Vec::new(),
            calculation_time_ms: None,
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: ForecastWarning) {
        self.warnings.push(warning);
    }

    /// 被略過的商品ID
    pub fn skipped_products(&self) -> Vec<EntityId> {
        self.warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .filter_map(|w| w.product_id)
            .collect()
    }
}

/// 預測警告
#[derive(Debug, Clone)]
pub struct ForecastWarning {
    pub product_id: Option<EntityId>,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ForecastWarning {
    pub fn new(product_id: Option<EntityId>, message: String, severity: WarningSeverity) -> Self {
        Self {
            product_id,
            message,
            severity,
        }
    }

    pub fn warning(product_id: Option<EntityId>, message: String) -> Self {
        Self::new(product_id, message, WarningSeverity::Warning)
    }

    pub fn error(product_id: Option<EntityId>, message: String) -> Self {
        Self::new(product_id, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Warning,
    Error,
}
