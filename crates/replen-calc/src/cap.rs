//! 每月訂購上限解析

use replen_core::{Catalog, EntityId, Product};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

/// 月上限解析器
///
/// 依序檢查商品本身的欄位，再檢查父商品；第一個正數即為上限，否則為 0（不限）。
pub struct MonthlyCapResolver {
    catalog: Arc<dyn Catalog>,
    keys: Vec<String>,
}

impl MonthlyCapResolver {
    /// 創建新的月上限解析器
    pub fn new(catalog: Arc<dyn Catalog>, keys: Vec<String>) -> Self {
        Self { catalog, keys }
    }

    /// 依商品ID讀取月上限
    pub fn get_monthly_cap(&self, product_id: EntityId) -> Decimal {
        if product_id == 0 {
            return Decimal::ZERO;
        }

        match self.catalog.get_product(product_id) {
            Ok(Some(product)) => self.cap_for_product(&product),
            Ok(None) => self.own_cap(product_id).unwrap_or(Decimal::ZERO),
            Err(e) => {
                tracing::warn!("無法讀取商品 {}，月上限視為不限: {}", product_id, e);
                Decimal::ZERO
            }
        }
    }

    /// 已載入商品的月上限
    pub fn cap_for_product(&self, product: &Product) -> Decimal {
        if let Some(cap) = self.own_cap(product.id) {
            return cap;
        }

        match product.parent_id {
            Some(parent_id) if parent_id > 0 => {
                self.own_cap(parent_id).unwrap_or(Decimal::ZERO)
            }
            _ => Decimal::ZERO,
        }
    }

    fn own_cap(&self, product_id: EntityId) -> Option<Decimal> {
        for key in &self.keys {
            let raw = match self.catalog.get_meta(product_id, key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("無法讀取商品 {} 欄位 {}: {}", product_id, key, e);
                    continue;
                }
            };

            if let Some(value) = parse_quantity(&raw) {
                if value > Decimal::ZERO {
                    return Some(value);
                }
            }
        }
        None
    }
}

/// 解析數量字串（接受科學記號）
fn parse_quantity(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}
