//! 預測列後處理

use replen_core::{EntityId, ForecastRow};

/// 預測列後處理器
///
/// 在供應商的所有預測列計算完成後依註冊順序執行，可附加欄位或重新排序。
pub trait RowProcessor: Send + Sync {
    fn process(&self, supplier_id: EntityId, rows: &mut Vec<ForecastRow>);
}

impl<F> RowProcessor for F
where
    F: Fn(EntityId, &mut Vec<ForecastRow>) + Send + Sync,
{
    fn process(&self, supplier_id: EntityId, rows: &mut Vec<ForecastRow>) {
        self(supplier_id, rows)
    }
}

/// 後處理管線
#[derive(Default)]
pub struct RowPipeline {
    processors: Vec<Box<dyn RowProcessor>>,
}

impl RowPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 註冊後處理器
    pub fn push<P: RowProcessor + 'static>(&mut self, processor: P) {
        self.processors.push(Box::new(processor));
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// 依序執行所有後處理器
    pub fn apply(&self, supplier_id: EntityId, rows: &mut Vec<ForecastRow>) {
        for processor in &self.processors {
            processor.process(supplier_id, rows);
        }
    }
}

/// 內建後處理器：附加覆蓋天數 `days_of_cover`（無需求時為 null）
pub fn days_of_cover(_supplier_id: EntityId, rows: &mut Vec<ForecastRow>) {
    for row in rows.iter_mut() {
        let value = match row.days_of_cover() {
            Some(days) => serde_json::Value::String(format!("{:.1}", days)),
            None => serde_json::Value::Null,
        };
        row.set_extra("days_of_cover", value);
    }
}

/// 內建後處理器：依建議訂購量由大到小排序
pub fn sort_by_suggested(_supplier_id: EntityId, rows: &mut Vec<ForecastRow>) {
    rows.sort_by(|a, b| {
        b.suggested_capped
            .cmp(&a.suggested_capped)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
}
