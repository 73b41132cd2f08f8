/// HTTP handlers
///
/// Caller identity comes from the `x-user-id` header set by the gateway.
/// Responses carry the join status and its message code; display text is
/// produced downstream by the localization service.
use actix_web::{web, HttpRequest, HttpResponse};
use join_status::{
    AttendanceInfo, ChatSpaceMembershipInfo, JoinStatus, MemberRole, MembershipExitState,
    RequestToJoinStatus,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::metrics;

pub mod chat_spaces;
pub mod streams;

const USER_ID_HEADER: &str = "x-user-id";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .service(
            web::scope("/api/v1")
                .configure(streams::configure)
                .configure(chat_spaces::configure),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn extract_user_id(req: &HttpRequest) -> AppResult<Uuid> {
    let header_value = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or(AppError::Unauthorized)?;

    let value = header_value.to_str().map_err(|_| AppError::Unauthorized)?;

    Uuid::parse_str(value).map_err(|_| AppError::Unauthorized)
}

#[derive(Debug, Serialize)]
pub struct AttendanceInfoResponse {
    pub request_to_join_status: Option<RequestToJoinStatus>,
    pub join_status: Option<JoinStatus>,
    pub message_code: Option<&'static str>,
    pub is_attending: bool,
    pub is_a_speaker: bool,
}

impl From<AttendanceInfo> for AttendanceInfoResponse {
    fn from(info: AttendanceInfo) -> Self {
        Self {
            request_to_join_status: info.request_to_join_status,
            join_status: info.join_status,
            message_code: info.join_status.map(|s| s.message_code()),
            is_attending: info.is_attending,
            is_a_speaker: info.is_a_speaker,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MembershipInfoResponse {
    pub request_to_join_status: Option<RequestToJoinStatus>,
    pub join_status: Option<JoinStatus>,
    pub message_code: Option<&'static str>,
    pub role: Option<MemberRole>,
    pub exit_state: Option<MembershipExitState>,
}

impl From<ChatSpaceMembershipInfo> for MembershipInfoResponse {
    fn from(info: ChatSpaceMembershipInfo) -> Self {
        Self {
            request_to_join_status: info.request_to_join_status,
            join_status: info.join_status,
            message_code: info.join_status.map(|s| s.message_code()),
            role: info.role,
            exit_state: info.exit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BulkUpdateResponse {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub allowed: bool,
}
