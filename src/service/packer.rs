use crate::db::{PackedOrderStore, ScanLogStore};
use crate::error::{AuthError, ExportError};
use crate::models::{PackingPhase, UiState};
use crate::service::auth::AuthGate;
use crate::service::exporter;
use crate::service::session::{Effect, PackingSession};
use chrono::Utc;
use futures::{Stream, StreamExt};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// 装箱服务编排器
///
/// 持有会话状态机 (Mutex 保证同一会话扫码互斥串行)、协作方句柄和
/// UI 状态快照的单写 watch 通道。状态机转换先提交并发布快照, 副作用
/// 再异步分发, 其失败不回滚转换。
pub struct PackerService {
    session: Mutex<PackingSession>,
    state: watch::Sender<UiState>,
    auth: AuthGate,
    packed_store: PackedOrderStore,
    scan_log: ScanLogStore,
    export_dir: PathBuf,
}

impl PackerService {
    pub async fn new(pool: SqlitePool, export_dir: PathBuf) -> Result<Arc<Self>, sqlx::Error> {
        let packed_store = PackedOrderStore::new(pool.clone());
        let packed_orders = packed_store.load().await?;
        tracing::info!("已装箱订单 {} 条", packed_orders.len());

        let (state, _) = watch::channel(UiState {
            packed_orders,
            ..UiState::default()
        });

        Ok(Arc::new(Self {
            session: Mutex::new(PackingSession::new()),
            state,
            auth: AuthGate::new(pool.clone()),
            packed_store,
            scan_log: ScanLogStore::new(pool),
            export_dir,
        }))
    }

    /// 订阅 UI 状态快照流
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.subscribe()
    }

    pub fn state_snapshot(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// 处理一条原始扫码串: 串行推进状态机, 提交快照, 分发副作用
    ///
    /// 会话锁覆盖整个 转换-发布-登记 过程: 快照按转换顺序对外可见,
    /// 且并发扫码不会在 packed_orders 登记前读到旧集合而重开刚完成
    /// 的订单 (PersistPacked 对每单恰好一次)。
    pub async fn on_scan(&self, raw: &str) {
        let mut session = self.session.lock().await;
        let packed_orders = self.state.borrow().packed_orders.clone();
        let outcome = session.on_scan(raw, &packed_orders, Utc::now());

        self.state.send_modify(|state| {
            state.phase = outcome.phase.clone();
            if let Some(message) = outcome.notification.clone() {
                state.notification = Some(message);
            }
            if let Some(flag) = outcome.overlay {
                state.show_packed_overlay = flag;
            }
            // 完成单在锁内同步登记, 后续扫码立即可见
            for effect in &outcome.effects {
                if let Effect::PersistPacked(order_id) = effect {
                    state.packed_orders.insert(order_id.clone());
                }
            }
        });

        for effect in outcome.effects {
            self.dispatch(effect);
        }
    }

    /// 消费扫码源流 (已由 ScanDebouncer 去重), 按到达顺序逐条处理
    pub async fn run_scanner_feed<S>(&self, feed: S)
    where
        S: Stream<Item = String>,
    {
        futures::pin_mut!(feed);
        while let Some(raw) = feed.next().await {
            self.on_scan(&raw).await;
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.auth.sign_in(email, password).await?;
        self.state.send_modify(|state| state.is_signed_in = true);
        Ok(())
    }

    /// 登出并重置会话 (已装箱持久状态不受影响)
    pub async fn sign_out(&self) {
        self.auth.sign_out();
        self.reset_session().await;
        self.state.send_modify(|state| state.is_signed_in = false);
    }

    pub async fn reset_session(&self) {
        let mut session = self.session.lock().await;
        session.reset();
        let phase = session.phase().clone();
        drop(session);

        self.state.send_modify(|state| {
            state.phase = phase;
            state.show_packed_overlay = false;
        });
    }

    /// 导出当前会话的扫码日志为 CSV 文件
    ///
    /// 导出前对日志做原子快照, 与后续扫码互不干扰; 无论成败,
    /// export_in_progress 都会清除。
    pub async fn export_csv(&self) -> Result<PathBuf, ExportError> {
        self.state.send_modify(|state| state.export_in_progress = true);

        let events = {
            let session = self.session.lock().await;
            session.events().to_vec()
        };
        let result = exporter::export_to_dir(&self.export_dir, &events, Utc::now());

        self.state.send_modify(|state| state.export_in_progress = false);
        result
    }

    pub fn consume_notification(&self) {
        self.state.send_modify(|state| state.notification = None);
    }

    pub fn consume_overlay(&self) {
        self.state.send_modify(|state| state.show_packed_overlay = false);
    }

    /// 当前阶段 (测试和日志用)
    pub fn phase(&self) -> PackingPhase {
        self.state.borrow().phase.clone()
    }

    /// 分发持久化副作用 (内存登记已在 on_scan 锁内完成)
    fn dispatch(&self, effect: Effect) {
        match effect {
            Effect::PersistPacked(order_id) => {
                // 持久写入尽力而为, 失败不回滚已提交的转换
                let store = self.packed_store.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.mark_packed(&order_id).await {
                        tracing::warn!("标记订单 {} 已装箱失败: {}", order_id, e);
                    }
                });
            }
            Effect::AppendLog(event) => {
                let store = self.scan_log.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.append(&event).await {
                        tracing::warn!("扫码日志写入失败: {}", e);
                    }
                });
            }
        }
    }
}
