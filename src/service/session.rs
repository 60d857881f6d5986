use crate::models::{ChecklistEntry, InvoicePayload, PackingPhase, ScanEvent, ScanSource};
use crate::service::codec;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;

/// 状态转换提交后由外层驱动器分发的副作用描述符
///
/// 状态机自身不依赖任何并发运行时: 转换先提交, 副作用异步尽力执行,
/// 失败不回滚已提交的转换。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// 将订单号写入已装箱持久集合
    PersistPacked(String),
    /// 向远程扫码日志追加一条事件
    AppendLog(ScanEvent),
}

/// 一次 `on_scan` 的结果: 新阶段快照 + 至多一条通知 + 按序副作用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub phase: PackingPhase,
    pub notification: Option<String>,
    pub effects: Vec<Effect>,
    /// Some(true) 显示装箱完成浮层, Some(false) 清除, None 不变
    pub overlay: Option<bool>,
}

impl ScanOutcome {
    fn unchanged(phase: PackingPhase) -> Self {
        Self {
            phase,
            notification: None,
            effects: Vec::new(),
            overlay: None,
        }
    }

    fn notify(phase: PackingPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            notification: Some(message.into()),
            effects: Vec::new(),
            overlay: None,
        }
    }
}

/// 装箱会话状态机
///
/// 持有当前阶段、可变清单、有序扫码事件日志和原始装箱单 (完成时恢复
/// 订单号用)。同一会话的 `on_scan` 必须互斥串行调用, 按到达顺序逐条
/// 处理; 去重由外部扫码源负责, 这里对送达的每条原始串无条件处理。
#[derive(Debug, Default)]
pub struct PackingSession {
    phase: PackingPhase,
    invoice: Option<InvoicePayload>,
    checklist: Vec<ChecklistEntry>,
    scan_events: Vec<ScanEvent>,
}

impl PackingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &PackingPhase {
        &self.phase
    }

    /// 当前会话累计的扫码事件 (自上次装箱单加载/重置起)
    pub fn events(&self) -> &[ScanEvent] {
        &self.scan_events
    }

    /// 处理一条原始扫码串
    ///
    /// 编解码失败只产生通知, 不终止会话也不丢失已累计的清单状态;
    /// 阶段只在输入完全通过校验时推进。
    pub fn on_scan(
        &mut self,
        raw: &str,
        packed_orders: &IndexSet<String>,
        now: DateTime<Utc>,
    ) -> ScanOutcome {
        if raw.trim().is_empty() {
            return ScanOutcome::unchanged(self.phase.clone());
        }

        match self.phase.clone() {
            PackingPhase::AwaitingInvoice => self.handle_invoice(raw, packed_orders, now),
            PackingPhase::ReadyToPack { order_id, .. } => self.handle_product(raw, &order_id, now),
            PackingPhase::Completed { order_id, .. } => {
                // 已装箱状态下允许直接扫下一张装箱单开启新订单
                if raw.starts_with(codec::INVOICE_PREFIX) {
                    self.handle_invoice(raw, packed_orders, now)
                } else {
                    ScanOutcome::notify(
                        self.phase.clone(),
                        format!("Order {} already packed. Scan next invoice.", order_id),
                    )
                }
            }
        }
    }

    /// 清空装箱单、清单和扫码日志, 阶段回到 AwaitingInvoice
    ///
    /// 不产生副作用 (已装箱持久状态不受影响)。
    pub fn reset(&mut self) {
        self.invoice = None;
        self.checklist.clear();
        self.scan_events.clear();
        self.phase = PackingPhase::AwaitingInvoice;
    }

    fn handle_invoice(
        &mut self,
        raw: &str,
        packed_orders: &IndexSet<String>,
        now: DateTime<Utc>,
    ) -> ScanOutcome {
        let Some(payload) = codec::decode_invoice(raw) else {
            return ScanOutcome::notify(self.phase.clone(), "Invalid invoice QR");
        };
        let order_id = payload.order_id.clone();
        if packed_orders.contains(&order_id) {
            return ScanOutcome::notify(
                self.phase.clone(),
                format!("Order {} already packed", order_id),
            );
        }

        let total_required = payload.total_required();
        self.checklist = payload
            .items
            .iter()
            .map(|item| ChecklistEntry::new(item.sku.clone(), item.units))
            .collect();
        self.scan_events.clear();
        self.invoice = Some(payload);
        self.phase = PackingPhase::ReadyToPack {
            order_id: order_id.clone(),
            checklist: self.checklist.clone(),
            scanned_count: 0,
            total_required,
        };

        // 装箱单扫码以订单号作为伪 SKU 记入日志
        let event = self.record_event(&order_id, &order_id, ScanSource::Invoice, now);

        ScanOutcome {
            phase: self.phase.clone(),
            notification: Some(format!("Invoice {} ready", order_id)),
            effects: vec![Effect::AppendLog(event)],
            overlay: Some(false),
        }
    }

    fn handle_product(&mut self, raw: &str, order_id: &str, now: DateTime<Utc>) -> ScanOutcome {
        let Some(sku) = codec::decode_product_token(raw) else {
            return ScanOutcome::notify(self.phase.clone(), "Unsupported SKU barcode");
        };

        // 忽略大小写定位清单条目; 同 SKU 多行时始终命中第一行
        let Some(index) = self
            .checklist
            .iter()
            .position(|entry| entry.sku.eq_ignore_ascii_case(&sku))
        else {
            return ScanOutcome::notify(
                self.phase.clone(),
                format!("SKU {} not in checklist", sku),
            );
        };

        if self.checklist[index].is_complete() {
            return ScanOutcome::notify(
                self.phase.clone(),
                format!("SKU {} already complete", sku),
            );
        }

        self.checklist[index].record_scan();
        let event = self.record_event(order_id, &sku, ScanSource::Product, now);

        let scanned_count: u32 = self.checklist.iter().map(|entry| entry.scanned).sum();
        let all_complete = self.checklist.iter().all(ChecklistEntry::is_complete);

        if all_complete {
            self.phase = PackingPhase::Completed {
                order_id: order_id.to_string(),
                checklist: self.checklist.clone(),
            };
            ScanOutcome {
                phase: self.phase.clone(),
                notification: Some(format!("Order {} packed", order_id)),
                effects: vec![
                    Effect::AppendLog(event),
                    Effect::PersistPacked(order_id.to_string()),
                ],
                overlay: Some(true),
            }
        } else {
            let total_required = self
                .invoice
                .as_ref()
                .map(InvoicePayload::total_required)
                .unwrap_or(0);
            self.phase = PackingPhase::ReadyToPack {
                order_id: order_id.to_string(),
                checklist: self.checklist.clone(),
                scanned_count,
                total_required,
            };
            ScanOutcome {
                phase: self.phase.clone(),
                notification: None,
                effects: vec![Effect::AppendLog(event)],
                overlay: None,
            }
        }
    }

    fn record_event(
        &mut self,
        order_id: &str,
        sku: &str,
        source: ScanSource,
        now: DateTime<Utc>,
    ) -> ScanEvent {
        let event = ScanEvent {
            timestamp: now,
            order_id: order_id.to_string(),
            sku: sku.to_string(),
            quantity: 1,
            source,
        };
        self.scan_events.push(event.clone());
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;
    use base64::Engine;

    fn invoice_qr(order_id: &str, items: &[(&str, u32)]) -> String {
        let items_json: Vec<String> = items
            .iter()
            .map(|(sku, units)| format!(r#"["{}",{}]"#, sku, units))
            .collect();
        let json = format!(
            r#"{{"o":"{}","i":[{}]}}"#,
            order_id,
            items_json.join(",")
        );
        format!("PKG1:{}", URL_SAFE.encode(json))
    }

    fn no_packed() -> IndexSet<String> {
        IndexSet::new()
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn blank_scan_is_a_noop() {
        let mut session = PackingSession::new();
        let outcome = session.on_scan("   ", &no_packed(), now());
        assert_eq!(outcome.phase, PackingPhase::AwaitingInvoice);
        assert_eq!(outcome.notification, None);
        assert!(outcome.effects.is_empty());
    }

    #[test]
    fn malformed_invoice_keeps_phase_and_notifies() {
        let mut session = PackingSession::new();
        for raw in [
            "garbage",
            "PKG1:!!!bad-base64",
            &format!("PKG1:{}", URL_SAFE.encode("not json")),
            &format!("PKG1:{}", URL_SAFE.encode(r#"{"o":"","i":[]}"#)),
        ] {
            let outcome = session.on_scan(raw, &no_packed(), now());
            assert_eq!(outcome.phase, PackingPhase::AwaitingInvoice);
            assert_eq!(outcome.notification.as_deref(), Some("Invalid invoice QR"));
            assert!(outcome.effects.is_empty());
        }
    }

    #[test]
    fn valid_invoice_builds_checklist_in_order() {
        let mut session = PackingSession::new();
        let outcome = session.on_scan(
            &invoice_qr("ORD-1", &[("SKU-A", 2), ("SKU-B", 1), ("SKU-C", 3)]),
            &no_packed(),
            now(),
        );
        match &outcome.phase {
            PackingPhase::ReadyToPack {
                order_id,
                checklist,
                scanned_count,
                total_required,
            } => {
                assert_eq!(order_id, "ORD-1");
                assert_eq!(*scanned_count, 0);
                assert_eq!(*total_required, 6);
                let skus: Vec<&str> = checklist.iter().map(|e| e.sku.as_str()).collect();
                assert_eq!(skus, vec!["SKU-A", "SKU-B", "SKU-C"]);
            }
            other => panic!("unexpected phase: {:?}", other),
        }
        assert_eq!(outcome.notification.as_deref(), Some("Invoice ORD-1 ready"));
        assert_eq!(outcome.overlay, Some(false));
        // 装箱单扫码本身记一条 INVOICE 日志
        assert_eq!(outcome.effects.len(), 1);
        match &outcome.effects[0] {
            Effect::AppendLog(event) => {
                assert_eq!(event.sku, "ORD-1");
                assert_eq!(event.order_id, "ORD-1");
                assert_eq!(event.quantity, 1);
                assert_eq!(event.source, ScanSource::Invoice);
            }
            other => panic!("unexpected effect: {:?}", other),
        }
    }

    #[test]
    fn already_packed_order_is_rejected() {
        let mut session = PackingSession::new();
        let mut packed = IndexSet::new();
        packed.insert("ORD-1".to_string());
        let outcome = session.on_scan(&invoice_qr("ORD-1", &[("SKU-A", 1)]), &packed, now());
        assert_eq!(outcome.phase, PackingPhase::AwaitingInvoice);
        assert_eq!(
            outcome.notification.as_deref(),
            Some("Order ORD-1 already packed")
        );
        assert!(outcome.effects.is_empty());
    }

    #[test]
    fn unsupported_product_token_notifies() {
        let mut session = PackingSession::new();
        session.on_scan(&invoice_qr("ORD-1", &[("SKU-A", 1)]), &no_packed(), now());
        let outcome = session.on_scan("PKT1:%%%", &no_packed(), now());
        assert_eq!(
            outcome.notification.as_deref(),
            Some("Unsupported SKU barcode")
        );
        assert!(matches!(outcome.phase, PackingPhase::ReadyToPack { .. }));
    }

    #[test]
    fn unknown_sku_notifies_without_mutation() {
        let mut session = PackingSession::new();
        session.on_scan(&invoice_qr("ORD-1", &[("SKU-A", 1)]), &no_packed(), now());
        let outcome = session.on_scan("SKU-X", &no_packed(), now());
        assert_eq!(
            outcome.notification.as_deref(),
            Some("SKU SKU-X not in checklist")
        );
        match &outcome.phase {
            PackingPhase::ReadyToPack { scanned_count, .. } => assert_eq!(*scanned_count, 0),
            other => panic!("unexpected phase: {:?}", other),
        }
    }

    #[test]
    fn product_scan_matches_case_insensitively() {
        let mut session = PackingSession::new();
        session.on_scan(
            &invoice_qr("ORD-1", &[("sku-a", 2), ("SKU-B", 1)]),
            &no_packed(),
            now(),
        );
        let outcome = session.on_scan("sku-a", &no_packed(), now());
        match &outcome.phase {
            PackingPhase::ReadyToPack {
                checklist,
                scanned_count,
                ..
            } => {
                assert_eq!(*scanned_count, 1);
                assert_eq!(checklist[0].scanned, 1);
                // 装箱单明细 SKU 原样保留
                assert_eq!(checklist[0].sku, "sku-a");
            }
            other => panic!("unexpected phase: {:?}", other),
        }
        assert_eq!(outcome.notification, None);
    }

    #[test]
    fn rescanning_complete_sku_is_idempotent() {
        let mut session = PackingSession::new();
        session.on_scan(
            &invoice_qr("ORD-1", &[("SKU-A", 1), ("SKU-B", 1)]),
            &no_packed(),
            now(),
        );
        session.on_scan("SKU-A", &no_packed(), now());
        let outcome = session.on_scan("SKU-A", &no_packed(), now());
        assert_eq!(
            outcome.notification.as_deref(),
            Some("SKU SKU-A already complete")
        );
        assert!(outcome.effects.is_empty());
        match &outcome.phase {
            PackingPhase::ReadyToPack { checklist, .. } => {
                assert_eq!(checklist[0].scanned, 1);
            }
            other => panic!("unexpected phase: {:?}", other),
        }
    }

    #[test]
    fn duplicate_sku_lines_update_first_entry_only() {
        let mut session = PackingSession::new();
        session.on_scan(
            &invoice_qr("ORD-1", &[("SKU-A", 1), ("SKU-A", 1)]),
            &no_packed(),
            now(),
        );
        session.on_scan("SKU-A", &no_packed(), now());
        let outcome = session.on_scan("SKU-A", &no_packed(), now());
        // 第一行扫齐后重复 SKU 被其遮蔽, 第二行永远不会被更新
        assert_eq!(
            outcome.notification.as_deref(),
            Some("SKU SKU-A already complete")
        );
        match &outcome.phase {
            PackingPhase::ReadyToPack { checklist, .. } => {
                assert_eq!(checklist[0].scanned, 1);
                assert_eq!(checklist[1].scanned, 0);
            }
            other => panic!("unexpected phase: {:?}", other),
        }
    }

    #[test]
    fn completion_emits_persist_packed_exactly_once() {
        let mut session = PackingSession::new();
        session.on_scan(
            &invoice_qr("ORD-1", &[("SKU-A", 2), ("SKU-B", 1)]),
            &no_packed(),
            now(),
        );
        let mut persist_count = 0;
        for raw in ["SKU-A", "SKU-A", "SKU-B"] {
            let outcome = session.on_scan(raw, &no_packed(), now());
            persist_count += outcome
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::PersistPacked(_)))
                .count();
        }
        assert_eq!(persist_count, 1);
        match session.phase() {
            PackingPhase::Completed { order_id, checklist } => {
                assert_eq!(order_id, "ORD-1");
                assert!(checklist.iter().all(ChecklistEntry::is_complete));
            }
            other => panic!("unexpected phase: {:?}", other),
        }
    }

    #[test]
    fn completion_notifies_and_sets_overlay() {
        let mut session = PackingSession::new();
        session.on_scan(&invoice_qr("ORD-1", &[("SKU-A", 1)]), &no_packed(), now());
        let outcome = session.on_scan("SKU-A", &no_packed(), now());
        assert_eq!(outcome.notification.as_deref(), Some("Order ORD-1 packed"));
        assert_eq!(outcome.overlay, Some(true));
        assert_eq!(
            outcome.effects.last(),
            Some(&Effect::PersistPacked("ORD-1".to_string()))
        );
    }

    #[test]
    fn non_invoice_scan_while_completed_keeps_phase() {
        let mut session = PackingSession::new();
        session.on_scan(&invoice_qr("ORD-1", &[("SKU-A", 1)]), &no_packed(), now());
        session.on_scan("SKU-A", &no_packed(), now());
        let outcome = session.on_scan("SKU-A", &no_packed(), now());
        assert_eq!(
            outcome.notification.as_deref(),
            Some("Order ORD-1 already packed. Scan next invoice.")
        );
        assert!(matches!(outcome.phase, PackingPhase::Completed { .. }));
        assert!(outcome.effects.is_empty());
    }

    #[test]
    fn invoice_scan_while_completed_starts_next_order() {
        let mut session = PackingSession::new();
        session.on_scan(&invoice_qr("ORD-1", &[("SKU-A", 1)]), &no_packed(), now());
        session.on_scan("SKU-A", &no_packed(), now());
        assert_eq!(session.events().len(), 2);

        let outcome = session.on_scan(
            &invoice_qr("ORD-2", &[("SKU-Z", 1)]),
            &no_packed(),
            now(),
        );
        match &outcome.phase {
            PackingPhase::ReadyToPack { order_id, .. } => assert_eq!(order_id, "ORD-2"),
            other => panic!("unexpected phase: {:?}", other),
        }
        // 新订单清空旧日志, 只剩新装箱单那条
        assert_eq!(session.events().len(), 1);
        assert_eq!(session.events()[0].order_id, "ORD-2");
        assert_eq!(outcome.overlay, Some(false));
    }

    #[test]
    fn invoice_scan_while_completed_for_packed_order_is_rejected() {
        let mut session = PackingSession::new();
        session.on_scan(&invoice_qr("ORD-1", &[("SKU-A", 1)]), &no_packed(), now());
        session.on_scan("SKU-A", &no_packed(), now());

        let mut packed = IndexSet::new();
        packed.insert("ORD-2".to_string());
        let outcome = session.on_scan(&invoice_qr("ORD-2", &[("SKU-Z", 1)]), &packed, now());
        assert_eq!(
            outcome.notification.as_deref(),
            Some("Order ORD-2 already packed")
        );
        assert!(matches!(outcome.phase, PackingPhase::Completed { .. }));
    }

    #[test]
    fn reset_returns_to_awaiting_invoice() {
        let mut session = PackingSession::new();
        session.on_scan(&invoice_qr("ORD-1", &[("SKU-A", 2)]), &no_packed(), now());
        session.on_scan("SKU-A", &no_packed(), now());
        session.reset();
        assert_eq!(session.phase(), &PackingPhase::AwaitingInvoice);
        assert!(session.events().is_empty());
    }

    #[test]
    fn all_zero_required_invoice_completes_on_first_product_scan_path() {
        // 件数全为 0 的装箱单: 加载后任何产品扫码都命中 already complete
        let mut session = PackingSession::new();
        session.on_scan(&invoice_qr("ORD-0", &[("SKU-A", 0)]), &no_packed(), now());
        let outcome = session.on_scan("SKU-A", &no_packed(), now());
        assert_eq!(
            outcome.notification.as_deref(),
            Some("SKU SKU-A already complete")
        );
        assert!(matches!(outcome.phase, PackingPhase::ReadyToPack { .. }));
    }
}
