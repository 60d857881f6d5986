use sqlx::SqlitePool;

/// 查询操作员口令摘要 (sha256 hex), 账号不存在返回 None
pub async fn password_digest(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT password_sha256
        FROM operators
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// 注册操作员账号 (已存在则跳过, 用于启动时播种)
pub async fn seed_operator(
    pool: &SqlitePool,
    email: &str,
    password_sha256: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO operators (email, password_sha256)
        VALUES (?, ?)
        "#,
    )
    .bind(email)
    .bind(password_sha256)
    .execute(pool)
    .await?;
    Ok(())
}
