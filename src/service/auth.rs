use crate::db::operators;
use crate::error::AuthError;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tokio::sync::watch;

/// 登录状态门
///
/// 对外暴露"操作员是否已登录"的可重启布尔流: 订阅者立即看到当前值,
/// 之后随登录/登出翻转。
#[derive(Debug)]
pub struct AuthGate {
    pool: SqlitePool,
    state: watch::Sender<bool>,
}

impl AuthGate {
    pub fn new(pool: SqlitePool) -> Self {
        let (state, _) = watch::channel(false);
        Self { pool, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    pub fn is_signed_in(&self) -> bool {
        *self.state.borrow()
    }

    /// 校验操作员账号口令; 失败返回可区分的 AuthError
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = email.trim();
        let stored = operators::password_digest(&self.pool, email).await?;
        match stored {
            Some(digest) if digest == sha256_hex(password) => {
                self.state.send_replace(true);
                tracing::info!("操作员 {} 登录成功", email);
                Ok(())
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    pub fn sign_out(&self) {
        self.state.send_replace(false);
    }
}

/// 口令 sha256 摘要 (hex 小写)
pub fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
