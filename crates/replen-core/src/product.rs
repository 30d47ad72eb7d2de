//! 商品與庫存狀態模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::EntityId;

/// 庫存狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    /// 有庫存
    InStock,
    /// 缺貨
    OutOfStock,
    /// 可預購
    OnBackorder,
}

/// 商品（唯讀，來自商品目錄）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// 商品ID
    pub id: EntityId,

    /// 料號
    pub sku: String,

    /// 名稱
    pub name: String,

    /// 現有庫存（目錄中可能為負值）
    pub stock_quantity: Decimal,

    /// 父商品ID（變體才有）
    pub parent_id: Option<EntityId>,

    /// 上架時間
    pub created_at: Option<DateTime<Utc>>,

    /// 是否啟用庫存管理
    pub manage_stock: bool,

    /// 庫存狀態
    pub stock_status: StockStatus,
}

impl Product {
    /// 創建新的商品
    pub fn new(id: EntityId, sku: String, name: String, stock_quantity: Decimal) -> Self {
        let stock_status = if stock_quantity > Decimal::ZERO {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        };
        Self {
            id,
            sku,
            name,
            stock_quantity,
            parent_id: None,
            created_at: None,
            manage_stock: true,
            stock_status,
        }
    }

    /// 建構器模式：設置父商品
    pub fn with_parent_id(mut self, parent_id: EntityId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// 建構器模式：設置上架時間
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// 建構器模式：設置庫存管理
    pub fn with_manage_stock(mut self, manage_stock: bool) -> Self {
        self.manage_stock = manage_stock;
        self
    }

    /// 建構器模式：設置庫存狀態
    pub fn with_stock_status(mut self, stock_status: StockStatus) -> Self {
        self.stock_status = stock_status;
        self
    }

    /// 現有庫存（負值視為 0）
    pub fn current_stock(&self) -> Decimal {
        self.stock_quantity.max(Decimal::ZERO)
    }

    /// 是否為變體
    pub fn is_variation(&self) -> bool {
        self.parent_id.is_some_and(|id| id > 0)
    }
}

/// 受庫存管理的商品 / 變體快照（供補登缺貨區間使用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub product_id: EntityId,
    /// 0 表示商品本身
    pub variation_id: EntityId,
    pub stock_quantity: Decimal,
}

impl StockItem {
    pub fn new(product_id: EntityId, variation_id: EntityId, stock_quantity: Decimal) -> Self {
        Self {
            product_id,
            variation_id,
            stock_quantity,
        }
    }

    /// 是否缺貨（庫存 ≤ 0）
    pub fn is_depleted(&self) -> bool {
        self.stock_quantity <= Decimal::ZERO
    }
}

/// 庫存變動通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockChange {
    pub product_id: EntityId,
    pub variation_id: EntityId,
    pub manage_stock: bool,
    pub stock_quantity: Decimal,
    pub stock_status: StockStatus,
}

impl StockChange {
    /// 創建新的庫存變動（狀態依數量推導）
    pub fn new(product_id: EntityId, variation_id: EntityId, stock_quantity: Decimal) -> Self {
        let stock_status = if stock_quantity > Decimal::ZERO {
            StockStatus::InStock
        } else {
            StockStatus::OutOfStock
        };
        Self {
            product_id,
            variation_id,
            manage_stock: true,
            stock_quantity,
            stock_status,
        }
    }

    /// 建構器模式：設置為不管理庫存
    pub fn unmanaged(mut self) -> Self {
        self.manage_stock = false;
        self
    }

    /// 建構器模式：設置庫存狀態
    pub fn with_stock_status(mut self, stock_status: StockStatus) -> Self {
        self.stock_status = stock_status;
        self
    }

    /// 是否為缺貨狀態
    pub fn is_out_of_stock(&self) -> bool {
        self.stock_quantity <= Decimal::ZERO || self.stock_status == StockStatus::OutOfStock
    }

    /// 是否已恢復供貨
    pub fn is_back_in_stock(&self) -> bool {
        self.stock_quantity > Decimal::ZERO && self.stock_status == StockStatus::InStock
    }
}
