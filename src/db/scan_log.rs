use crate::models::ScanEvent;
use chrono::SecondsFormat;
use sqlx::SqlitePool;

/// 远程扫码日志 - 每条被接受的扫码追加一行
///
/// 尽力而为: 调用方吞掉失败并记 warn, 不向操作员暴露。
#[derive(Debug, Clone)]
pub struct ScanLogStore {
    pool: SqlitePool,
}

impl ScanLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, event: &ScanEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO scan_events (timestamp, order_id, sku, quantity, source)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(
            event
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .bind(&event.order_id)
        .bind(&event.sku)
        .bind(event.quantity as i64)
        .bind(event.source.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScanSource;
    use chrono::Utc;

    #[tokio::test]
    async fn append_writes_one_row_per_event() {
        let pool = crate::db::pool::test_pool().await;
        let store = ScanLogStore::new(pool.clone());

        let event = ScanEvent {
            timestamp: Utc::now(),
            order_id: "ORD-1".to_string(),
            sku: "SKU-A".to_string(),
            quantity: 1,
            source: ScanSource::Product,
        };
        store.append(&event).await.unwrap();
        store.append(&event).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM scan_events")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let source: String =
            sqlx::query_scalar("SELECT source FROM scan_events ORDER BY id LIMIT 1")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(source, "PRODUCT");
    }
}
