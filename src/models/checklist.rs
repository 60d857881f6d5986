use serde::{Deserialize, Serialize};

/// 装箱清单条目 - 单个 SKU 的需求/已扫计数
///
/// 不变式: `scanned` 不会超过 `required` (更新时夹紧)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub sku: String,
    pub required: u32,
    pub scanned: u32,
}

impl ChecklistEntry {
    pub fn new(sku: impl Into<String>, required: u32) -> Self {
        Self {
            sku: sku.into(),
            required,
            scanned: 0,
        }
    }

    /// 剩余未扫件数
    pub fn remaining(&self) -> u32 {
        self.required.saturating_sub(self.scanned)
    }

    /// 该条目是否已扫齐
    pub fn is_complete(&self) -> bool {
        self.scanned >= self.required
    }

    /// 已扫件数加一 (夹紧到 required)
    pub fn record_scan(&mut self) {
        self.scanned = (self.scanned + 1).min(self.required);
    }
}
