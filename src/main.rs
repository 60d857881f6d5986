use axum::{
    routing::{get, post},
    Router,
};
use kitoko_packer_rust::db::operators;
use kitoko_packer_rust::service::auth::sha256_hex;
use kitoko_packer_rust::{api, create_pool, AppConfig, PackerService};
use std::path::PathBuf;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 创建数据库连接池
    let pool = create_pool(&config.database.url).await?;
    info!("Database pool created");

    // 播种操作员账号 (可选, 仅首次生效)
    if let (Some(email), Some(password)) = (&config.auth.seed_email, &config.auth.seed_password) {
        operators::seed_operator(&pool, email, &sha256_hex(password)).await?;
        info!("Seeded operator account {}", email);
    }

    // 创建装箱服务
    let service = PackerService::new(pool, PathBuf::from(&config.export.dir)).await?;

    // 构建路由
    let app = Router::new()
        .route("/health", get(api::health_check))
        .route("/api/state", get(api::get_state))
        .route("/api/scan", post(api::scan))
        .route("/api/session/reset", post(api::reset_session))
        .route("/api/export", post(api::export_csv))
        .route("/api/auth/signin", post(api::sign_in))
        .route("/api/auth/signout", post(api::sign_out))
        .route(
            "/api/state/consume-notification",
            post(api::consume_notification),
        )
        .route("/api/state/consume-overlay", post(api::consume_overlay))
        .with_state(service)
        .layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/state                      - 当前状态快照");
    info!("  POST /api/scan                       - 提交扫码串");
    info!("  POST /api/export                     - 导出扫码日志 CSV");
    info!("  POST /api/auth/signin                - 操作员登录");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
