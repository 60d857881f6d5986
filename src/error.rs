use thiserror::Error;

/// 登录失败 - 发生在扫码流水线之外, 作为可区分的错误返回给调用方,
/// 不走通知字符串
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// CSV 导出失败 - 必须向调用方显式报告, 与解码失败区分开
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer error: {0}")]
    Buffer(String),
    #[error("field contains csv delimiter or quote: {0}")]
    UnsafeField(String),
}
