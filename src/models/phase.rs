use super::ChecklistEntry;
use serde::{Deserialize, Serialize};

/// 装箱会话阶段 - 状态机的当前状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PackingPhase {
    /// 等待扫装箱单二维码 (初始状态)
    AwaitingInvoice,
    /// 装箱单已加载, 逐件扫货中
    ReadyToPack {
        order_id: String,
        checklist: Vec<ChecklistEntry>,
        scanned_count: u32,
        total_required: u32,
    },
    /// 整单扫齐
    Completed {
        order_id: String,
        checklist: Vec<ChecklistEntry>,
    },
}

impl Default for PackingPhase {
    fn default() -> Self {
        PackingPhase::AwaitingInvoice
    }
}
