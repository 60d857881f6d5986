use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 扫码来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanSource {
    Invoice,
    Product,
}

impl ScanSource {
    /// 枚举字面量 (CSV / 数据库存储格式)
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanSource::Invoice => "INVOICE",
            ScanSource::Product => "PRODUCT",
        }
    }
}

/// 扫码事件 - 每次被接受的扫码追加一条
///
/// 装箱单扫码以订单号作为伪 SKU 记录, quantity 恒为 1。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub timestamp: DateTime<Utc>,
    pub order_id: String,
    pub sku: String,
    pub quantity: u32,
    pub source: ScanSource,
}
