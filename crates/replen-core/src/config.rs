//! 預測配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OrderStatus, ReplenError};

/// 月上限欄位名稱（依優先順序，後兩者為舊名稱）
pub const MONTHLY_CAP_KEYS: [&str; 3] = [
    "max_order_qty_per_month",
    "max_qty_per_month",
    "max_order_qty_per month",
];

/// 平均每月天數
pub const DAYS_PER_MONTH: Decimal = Decimal::from_parts(304_375, 0, 0, false, 4);

/// 補貨預測配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// 無緩衝月數時使用的訂購週期（月）
    pub order_cycle_months: Decimal,

    /// 計入銷量的訂單狀態
    pub allowed_statuses: Vec<OrderStatus>,

    /// 缺貨區間保留年數（最少 1）
    pub retention_years: u32,

    /// 找不到供應商時的預設幣別
    pub default_currency: String,

    /// 無法讀取全域設定時的回溯天數
    pub fallback_lookback_days: u32,

    /// 月上限欄位名稱（依優先順序）
    pub monthly_cap_keys: Vec<String>,
}

impl ForecastConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self {
            order_cycle_months: Decimal::from(6),
            allowed_statuses: OrderStatus::COUNTED.to_vec(),
            retention_years: 5,
            default_currency: "GBP".to_string(),
            fallback_lookback_days: 365,
            monthly_cap_keys: MONTHLY_CAP_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// 建構器模式：設置訂購週期
    pub fn with_order_cycle_months(mut self, months: Decimal) -> Self {
        self.order_cycle_months = months.max(Decimal::ZERO);
        self
    }

    /// 建構器模式：設置訂單狀態
    pub fn with_allowed_statuses(mut self, statuses: Vec<OrderStatus>) -> Self {
        self.allowed_statuses = statuses;
        self
    }

    /// 建構器模式：設置保留年數
    pub fn with_retention_years(mut self, years: u32) -> Self {
        self.retention_years = years;
        self
    }

    /// 建構器模式：設置預設幣別
    pub fn with_default_currency(mut self, currency: String) -> Self {
        self.default_currency = currency;
        self
    }

    /// 建構器模式：設置月上限欄位名稱
    pub fn with_monthly_cap_keys(mut self, keys: Vec<String>) -> Self {
        self.monthly_cap_keys = keys;
        self
    }

    /// 有效保留年數（最少 1 年）
    pub fn effective_retention_years(&self) -> u32 {
        self.retention_years.max(1)
    }

    /// 從 JSON 載入配置（缺少的欄位使用預設值）
    ///
    /// # 範例
    /// ```
    /// # use replen_core::ForecastConfig;
    /// let config = ForecastConfig::from_json_str(r#"{"retention_years": 3}"#).unwrap();
    /// assert_eq!(config.retention_years, 3);
    /// assert_eq!(config.default_currency, "GBP");
    /// ```
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ReplenError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 檢查配置
    pub fn validate(&self) -> crate::Result<()> {
        if self.order_cycle_months < Decimal::ZERO {
            return Err(ReplenError::Config(format!(
                "訂購週期不可為負: {}",
                self.order_cycle_months
            )));
        }
        if self.allowed_statuses.is_empty() {
            return Err(ReplenError::Config("至少需要一個訂單狀態".to_string()));
        }
        if self.default_currency.trim().is_empty() {
            return Err(ReplenError::Config("預設幣別不可為空".to_string()));
        }
        if self.fallback_lookback_days == 0 {
            return Err(ReplenError::Config("回溯天數最少為 1".to_string()));
        }
        Ok(())
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = ForecastConfig::default();

        assert_eq!(config.order_cycle_months, Decimal::from(6));
        assert_eq!(config.retention_years, 5);
        assert_eq!(config.default_currency, "GBP");
        assert_eq!(config.monthly_cap_keys[0], "max_order_qty_per_month");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_days_per_month_constant() {
        assert_eq!(DAYS_PER_MONTH, dec!(30.4375));
        assert_eq!(DAYS_PER_MONTH * Decimal::from(2), dec!(60.875));
    }

    #[test]
    fn test_config_builder() {
        let config = ForecastConfig::new()
            .with_order_cycle_months(dec!(-1))
            .with_retention_years(0)
            .with_allowed_statuses(vec![OrderStatus::Completed]);

        assert_eq!(config.order_cycle_months, Decimal::ZERO);
        assert_eq!(config.effective_retention_years(), 1);
        assert_eq!(config.allowed_statuses, vec![OrderStatus::Completed]);
    }

    #[test]
    fn test_from_json() {
        let config = ForecastConfig::from_json_str(
            r#"{"order_cycle_months": "4", "allowed_statuses": ["completed", "on-hold"]}"#,
        )
        .unwrap();

        assert_eq!(config.order_cycle_months, Decimal::from(4));
        assert_eq!(
            config.allowed_statuses,
            vec![OrderStatus::Completed, OrderStatus::OnHold]
        );
        assert_eq!(config.retention_years, 5);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(ForecastConfig::from_json_str("not json").is_err());
        assert!(ForecastConfig::from_json_str(r#"{"allowed_statuses": []}"#).is_err());
        assert!(ForecastConfig::from_json_str(r#"{"default_currency": " "}"#).is_err());
    }
}
