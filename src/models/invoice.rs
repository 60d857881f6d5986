use serde::{Deserialize, Serialize};

/// 装箱单载荷 (由 PKG1 二维码解码得到)
///
/// 解析成功后不可变, 由当前装箱会话独占持有。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoicePayload {
    pub order_id: String,
    pub items: Vec<InvoiceItem>,
}

/// 装箱单明细行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub sku: String,
    pub units: u32,
}

impl InvoicePayload {
    /// 所有明细行的需求件数之和
    pub fn total_required(&self) -> u32 {
        self.items.iter().map(|item| item.units).sum()
    }
}
