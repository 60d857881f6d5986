use super::PackingPhase;
use indexmap::IndexSet;
use serde::Serialize;

/// 面向展示层的只读状态快照
///
/// 单写多读: 每次被接受的变更整体替换快照, 读者只观察到已提交的值。
#[derive(Debug, Clone, Default, Serialize)]
pub struct UiState {
    pub is_signed_in: bool,
    pub phase: PackingPhase,
    pub notification: Option<String>,
    pub show_packed_overlay: bool,
    pub export_in_progress: bool,
    pub packed_orders: IndexSet<String>,
}
