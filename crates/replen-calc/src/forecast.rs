//! 補貨預測主計算器

use chrono::NaiveDate;
use rayon::prelude::*;
use replen_core::config::DAYS_PER_MONTH;
use replen_core::{
    Catalog, Clock, EntityId, ForecastConfig, ForecastRow, Product, ReplenError, SupplierPolicy,
    SupplierRegistry,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::{
    Collaborators, DemandSummarizer, ForecastReport, ForecastWarning, MonthlyCapResolver,
    RowPipeline, RowProcessor, StockoutLedger, SupplierPolicyResolver,
};

/// 補貨預測計算器
pub struct ForecastEngine {
    catalog: Arc<dyn Catalog>,
    suppliers: Arc<dyn SupplierRegistry>,
    clock: Arc<dyn Clock>,
    ledger: Arc<StockoutLedger>,
    policy_resolver: SupplierPolicyResolver,
    summarizer: DemandSummarizer,
    caps: MonthlyCapResolver,
    pipeline: RowPipeline,
    config: ForecastConfig,

    /// 分析日（None 表示使用時鐘的今天）
    as_of: Option<NaiveDate>,
}

impl ForecastEngine {
    /// 創建新的預測計算器
    pub fn new(collaborators: Collaborators, config: ForecastConfig) -> Self {
        let ledger = Arc::new(StockoutLedger::new(
            collaborators.stockouts.clone(),
            collaborators.legacy.clone(),
            collaborators.catalog.clone(),
            collaborators.clock.clone(),
        ));
        let policy_resolver = SupplierPolicyResolver::new(
            collaborators.suppliers.clone(),
            collaborators.settings.clone(),
            config.clone(),
        );
        let summarizer = DemandSummarizer::new(
            collaborators.catalog.clone(),
            collaborators.orders.clone(),
            ledger.clone(),
            config.allowed_statuses.clone(),
        );
        let caps = MonthlyCapResolver::new(
            collaborators.catalog.clone(),
            config.monthly_cap_keys.clone(),
        );

        Self {
            catalog: collaborators.catalog,
            suppliers: collaborators.suppliers,
            clock: collaborators.clock,
            ledger,
            policy_resolver,
            summarizer,
            caps,
            pipeline: RowPipeline::new(),
            config,
            as_of: None,
        }
    }

    /// 建構器模式：設置分析日
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// 建構器模式：註冊後處理器
    pub fn with_processor<P: RowProcessor + 'static>(mut self, processor: P) -> Self {
        self.pipeline.push(processor);
        self
    }

    /// 註冊後處理器
    pub fn add_processor<P: RowProcessor + 'static>(&mut self, processor: P) {
        self.pipeline.push(processor);
    }

    /// 分析日
    pub fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| self.clock.now().date_naive())
    }

    /// 單一商品預測
    pub fn forecast_product(
        &self,
        product: &Product,
        policy: &SupplierPolicy,
        lookback_days: u32,
        order_cycle_months: Decimal,
    ) -> replen_core::Result<ForecastRow> {
        if product.id == 0 {
            return Err(ReplenError::InvalidInput("商品ID不可為 0".to_string()));
        }

        // Step 1: 需求摘要
        let summary = self
            .summarizer
            .summarize_product(product, lookback_days, self.as_of());
        let demand_per_day = summary.demand_per_day;

        // Step 2-3: 交期與緩衝天數
        let lead_days = policy.lead_days().max(Decimal::ZERO);
        let buffer_days = checked_mul(policy.buffer_months, DAYS_PER_MONTH, "緩衝天數")?
            .max(Decimal::ZERO);

        // Step 4: 交期與緩衝期需求
        let lead_demand = checked_mul(demand_per_day, lead_days, "交期需求")?;
        let buffer_demand = checked_mul(demand_per_day, buffer_days, "緩衝需求")?;

        // Step 5-6: 到貨時庫存（在途固定為 0）
        let current_stock = product.current_stock();
        let inbound_qty = Decimal::ZERO;
        let on_hand = current_stock + inbound_qty;
        let stock_at_arrival = checked_sub(on_hand, lead_demand, "到貨庫存")?.max(Decimal::ZERO);

        // Step 7-8: 目標庫存與預測需求
        let buffer_target = buffer_demand;
        let forecast_days = lead_days + buffer_days;
        let forecast_demand = checked_mul(demand_per_day, forecast_days, "預測需求")?;

        // Step 9: 建議訂購量
        let suggested_raw =
            checked_sub(buffer_target, stock_at_arrival, "建議訂購量")?.max(Decimal::ZERO);

        // Step 10-13: 月上限
        let max_per_month = self.caps.cap_for_product(product);
        let effective_cycle_months = if policy.buffer_months > Decimal::ZERO {
            policy.buffer_months
        } else {
            order_cycle_months
        }
        .max(Decimal::ZERO);
        let max_for_cycle =
            if max_per_month > Decimal::ZERO && effective_cycle_months > Decimal::ZERO {
                checked_mul(max_per_month, effective_cycle_months, "週期上限")?
            } else {
                Decimal::ZERO
            };
        let suggested_capped = if max_for_cycle > Decimal::ZERO {
            suggested_raw.min(max_for_cycle)
        } else {
            suggested_raw
        };

        Ok(ForecastRow {
            product_id: product.id,
            supplier_id: policy.supplier_id,
            sku: product.sku.clone(),
            name: product.name.clone(),
            currency: policy.currency.clone(),
            current_stock,
            qty_sold: summary.qty_sold,
            demand_per_day,
            lead_days,
            buffer_days,
            forecast_days,
            forecast_demand,
            lead_demand,
            demand_during_lead: lead_demand,
            buffer_demand,
            inbound_qty,
            stock_at_arrival,
            buffer_target,
            suggested_raw,
            suggested_capped,
            max_per_month,
            effective_cycle_months,
            max_for_cycle,
            total_days: summary.total_days,
            days_on_sale: summary.days_on_sale,
            stockout_days: summary.stockout_days,
            live_stockout_days: summary.live_stockout_days,
            legacy_stockout_days: summary.legacy_stockout_days,
            extras: BTreeMap::new(),
        })
    }

    /// 供應商所有商品的預測
    pub fn forecast_supplier(&self, supplier_id: EntityId) -> Vec<ForecastRow> {
        self.forecast_supplier_report(supplier_id).rows
    }

    /// 供應商所有商品的預測（含警告與耗時）
    pub fn forecast_supplier_report(&self, supplier_id: EntityId) -> ForecastReport {
        let start_time = std::time::Instant::now();
        let mut report = ForecastReport::empty(supplier_id);

        if supplier_id == 0 {
            report.add_warning(ForecastWarning::warning(None, "無效的供應商ID".to_string()));
            return report;
        }

        // Step 1: 解析政策（每個供應商一次）
        let policy = self.policy_resolver.resolve(supplier_id);
        if !policy.found {
            tracing::info!("供應商 {} 不存在，回傳空預測", supplier_id);
            report.add_warning(ForecastWarning::warning(
                None,
                format!("找不到供應商 {}", supplier_id),
            ));
            return report;
        }
        let lookback_days = policy.lookback_days;
        let order_cycle_months = self.policy_resolver.order_cycle_months();

        // Step 2: 商品清單
        let product_ids = match self.suppliers.get_products_for_supplier(supplier_id) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("無法讀取供應商 {} 的商品清單: {}", supplier_id, e);
                report.add_warning(ForecastWarning::warning(None, e.to_string()));
                report.policy = Some(policy);
                return report;
            }
        };

        tracing::info!(
            "開始補貨預測：供應商 {}，商品 {} 筆，回溯 {} 天",
            supplier_id,
            product_ids.len(),
            lookback_days
        );

        // Step 3: 逐商品計算（單一商品失敗不影響其他商品）
        let mut seen = HashSet::new();
        for product_id in product_ids {
            if product_id == 0 || !seen.insert(product_id) {
                continue;
            }

            let product = match self.catalog.get_product(product_id) {
                Ok(Some(product)) => product,
                Ok(None) => {
                    tracing::debug!("商品 {} 不存在，略過", product_id);
                    report.add_warning(ForecastWarning::error(
                        Some(product_id),
                        "商品不存在".to_string(),
                    ));
                    continue;
                }
                Err(e) => {
                    tracing::warn!(product_id, supplier_id, "無法讀取商品，略過: {}", e);
                    report.add_warning(ForecastWarning::error(Some(product_id), e.to_string()));
                    continue;
                }
            };

            match self.forecast_product(&product, &policy, lookback_days, order_cycle_months) {
                Ok(row) => report.rows.push(row),
                Err(e) => {
                    tracing::warn!(product_id, supplier_id, "商品預測失敗，略過: {}", e);
                    report.add_warning(ForecastWarning::error(Some(product_id), e.to_string()));
                }
            }
        }

        // Step 4: 後處理
        self.pipeline.apply(supplier_id, &mut report.rows);

        report.policy = Some(policy);
        report.calculation_time_ms = Some(start_time.elapsed().as_millis());

        tracing::info!(
            "補貨預測完成：供應商 {}，預測 {} 筆，略過 {} 筆，耗時 {:?}",
            supplier_id,
            report.rows.len(),
            report.skipped_products().len(),
            start_time.elapsed()
        );

        report
    }

    /// 多個供應商並行預測
    pub fn forecast_suppliers(
        &self,
        supplier_ids: &[EntityId],
    ) -> BTreeMap<EntityId, Vec<ForecastRow>> {
        supplier_ids
            .par_iter()
            .map(|&supplier_id| (supplier_id, self.forecast_supplier(supplier_id)))
            .collect()
    }

    /// 缺貨帳本
    pub fn ledger(&self) -> &StockoutLedger {
        &self.ledger
    }

    /// 政策解析器
    pub fn policy_resolver(&self) -> &SupplierPolicyResolver {
        &self.policy_resolver
    }

    /// 需求摘要計算器
    pub fn summarizer(&self) -> &DemandSummarizer {
        &self.summarizer
    }

    /// 月上限解析器
    pub fn caps(&self) -> &MonthlyCapResolver {
        &self.caps
    }

    /// 清除過期缺貨區間（使用配置中的保留年數）
    pub fn prune_stockouts(&self) -> usize {
        self.ledger.prune(self.config.effective_retention_years())
    }
}

fn checked_mul(a: Decimal, b: Decimal, what: &str) -> replen_core::Result<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| ReplenError::Computation(format!("{}溢位: {} × {}", what, a, b)))
}

fn checked_sub(a: Decimal, b: Decimal, what: &str) -> replen_core::Result<Decimal> {
    a.checked_sub(b)
        .ok_or_else(|| ReplenError::Computation(format!("{}溢位: {} − {}", what, a, b)))
}
