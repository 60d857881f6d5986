use crate::error::AuthError;
use crate::models::UiState;
use crate::service::PackerService;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 请求体: 一条原始扫码串
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub raw: String,
}

/// 请求体: 操作员登录
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
}

/// 导出响应体 (含产物路径)
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub success: bool,
    pub message: String,
    pub path: Option<String>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 当前 UI 状态快照
pub async fn get_state(State(service): State<Arc<PackerService>>) -> Json<UiState> {
    Json(service.state_snapshot())
}

/// 提交一条扫码串, 返回更新后的快照
///
/// 扫码流水线内的错误 (解码失败、重复订单等) 只体现为快照里的
/// notification, HTTP 层恒为 200。
pub async fn scan(
    State(service): State<Arc<PackerService>>,
    Json(req): Json<ScanRequest>,
) -> Json<UiState> {
    service.on_scan(&req.raw).await;
    Json(service.state_snapshot())
}

/// 重置当前装箱会话
pub async fn reset_session(State(service): State<Arc<PackerService>>) -> Json<CommandResponse> {
    service.reset_session().await;
    Json(CommandResponse {
        success: true,
        message: "session reset".to_string(),
    })
}

/// 导出当前会话扫码日志为 CSV
pub async fn export_csv(State(service): State<Arc<PackerService>>) -> Response {
    match service.export_csv().await {
        Ok(path) => {
            let response = ExportResponse {
                success: true,
                message: format!("Exported to {}", path.display()),
                path: Some(path.display().to_string()),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            let response = ExportResponse {
                success: false,
                message: format!("Error: {}", e),
                path: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

/// 操作员登录
pub async fn sign_in(
    State(service): State<Arc<PackerService>>,
    Json(req): Json<SignInRequest>,
) -> Response {
    match service.sign_in(&req.email, &req.password).await {
        Ok(()) => {
            let response = CommandResponse {
                success: true,
                message: "signed in".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            let response = CommandResponse {
                success: false,
                message: "invalid email or password".to_string(),
            };
            (StatusCode::UNAUTHORIZED, Json(response)).into_response()
        }
        Err(e) => {
            let response = CommandResponse {
                success: false,
                message: format!("Error: {}", e),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

/// 操作员登出 (同时重置会话)
pub async fn sign_out(State(service): State<Arc<PackerService>>) -> Json<CommandResponse> {
    service.sign_out().await;
    Json(CommandResponse {
        success: true,
        message: "signed out".to_string(),
    })
}

/// 消费一次性通知
pub async fn consume_notification(
    State(service): State<Arc<PackerService>>,
) -> Json<CommandResponse> {
    service.consume_notification();
    Json(CommandResponse {
        success: true,
        message: "notification consumed".to_string(),
    })
}

/// 消费装箱完成浮层
pub async fn consume_overlay(State(service): State<Arc<PackerService>>) -> Json<CommandResponse> {
    service.consume_overlay();
    Json(CommandResponse {
        success: true,
        message: "overlay consumed".to_string(),
    })
}
