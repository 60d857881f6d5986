use chrono::Utc;
use indexmap::IndexSet;
use sqlx::SqlitePool;

const LAST_ORDER_KEY: &str = "last_order_id";

/// 已装箱订单持久集合
///
/// 异步最终一致: 状态机侧只拿内存快照, 写入尽力而为。
#[derive(Debug, Clone)]
pub struct PackedOrderStore {
    pool: SqlitePool,
}

impl PackedOrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 加载全部已装箱订单号 (保序+去重)
    pub async fn load(&self) -> Result<IndexSet<String>, sqlx::Error> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT order_id
            FROM packed_orders
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    /// 标记订单已装箱, 同时记录最近一单
    pub async fn mark_packed(&self, order_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO packed_orders (order_id, packed_at)
            VALUES (?, ?)
            "#,
        )
        .bind(order_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO app_meta (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(LAST_ORDER_KEY)
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 撤销某订单的已装箱标记
    pub async fn reset_order(&self, order_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM packed_orders
            WHERE order_id = ?
            "#,
        )
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM app_meta
            WHERE key = ? AND value = ?
            "#,
        )
        .bind(LAST_ORDER_KEY)
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 清空全部已装箱记录
    pub async fn clear_all(&self) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM packed_orders")
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM app_meta WHERE key = ?")
            .bind(LAST_ORDER_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// 最近一次装箱的订单号
    pub async fn last_order_id(&self) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT value
            FROM app_meta
            WHERE key = ?
            "#,
        )
        .bind(LAST_ORDER_KEY)
        .fetch_optional(&self.pool)
        .await
    }
}
