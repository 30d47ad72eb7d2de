//! 供應商補貨政策解析

use replen_core::{
    EntityId, ForecastConfig, GlobalSettings, SettingsProvider, SupplierPolicy, SupplierRegistry,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// 供應商政策解析器
///
/// 找不到供應商或資料來源失敗時回傳歸零政策，不會回傳錯誤。
pub struct SupplierPolicyResolver {
    suppliers: Arc<dyn SupplierRegistry>,
    settings: Arc<dyn SettingsProvider>,
    config: ForecastConfig,
}

impl SupplierPolicyResolver {
    /// 創建新的政策解析器
    pub fn new(
        suppliers: Arc<dyn SupplierRegistry>,
        settings: Arc<dyn SettingsProvider>,
        config: ForecastConfig,
    ) -> Self {
        Self {
            suppliers,
            settings,
            config,
        }
    }

    /// 讀取全域設定（失敗時使用配置中的預設值）
    pub fn global_settings(&self) -> GlobalSettings {
        match self.settings.get_global_settings() {
            Ok(settings) => settings.normalized(),
            Err(e) => {
                tracing::warn!("無法讀取全域設定，使用預設值: {}", e);
                GlobalSettings::new(Decimal::ZERO, self.config.fallback_lookback_days)
            }
        }
    }

    /// 分析回溯天數（目前與供應商無關）
    pub fn lookback_days(&self, _supplier_id: Option<EntityId>) -> u32 {
        self.global_settings().analysis_lookback_days.max(1)
    }

    /// 解析供應商政策
    pub fn resolve(&self, supplier_id: EntityId) -> SupplierPolicy {
        let settings = self.global_settings();
        let zeroed = || {
            SupplierPolicy::zeroed(
                supplier_id,
                settings.analysis_lookback_days,
                self.config.default_currency.clone(),
            )
        };

        if supplier_id == 0 {
            return zeroed();
        }

        let supplier = match self.suppliers.get_supplier(supplier_id) {
            Ok(Some(supplier)) => supplier,
            Ok(None) => {
                tracing::debug!("找不到供應商 {}，使用歸零政策", supplier_id);
                return zeroed();
            }
            Err(e) => {
                tracing::warn!("無法讀取供應商 {}，使用歸零政策: {}", supplier_id, e);
                return zeroed();
            }
        };

        // 供應商覆寫優先（即使明確設為 0）
        let buffer_months = supplier
            .buffer_months_override
            .unwrap_or(settings.buffer_months_global)
            .max(Decimal::ZERO);

        let currency = if supplier.currency.trim().is_empty() {
            self.config.default_currency.clone()
        } else {
            supplier.currency
        };

        SupplierPolicy {
            supplier_id,
            lead_time_weeks: supplier.lead_time_weeks,
            buffer_months,
            holiday_extra_days: supplier.holiday_extra_days,
            lookback_days: settings.analysis_lookback_days,
            currency,
            found: true,
        }
    }

    /// 訂購週期（月）
    pub fn order_cycle_months(&self) -> Decimal {
        self.config.order_cycle_months
    }
}
