use actix_web::{web, HttpRequest, HttpResponse};
use join_status::ChatSpaceVisibility;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{extract_user_id, AccessResponse, MembershipInfoResponse};
use crate::domain::ChatSpace;
use crate::error::AppResult;
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat-spaces", web::post().to(create_chat_space))
        .route(
            "/chat-spaces/{chat_space_id}/membership",
            web::get().to(get_membership),
        )
        .route(
            "/chat-spaces/{chat_space_id}/access",
            web::get().to(get_access),
        )
        .route(
            "/chat-spaces/{chat_space_id}/join",
            web::post().to(request_to_join),
        )
        .route("/chat-spaces/{chat_space_id}/leave", web::post().to(leave))
        .route(
            "/chat-spaces/{chat_space_id}/members/{member_id}/approve",
            web::post().to(approve_member),
        )
        .route(
            "/chat-spaces/{chat_space_id}/members/{member_id}/pending",
            web::post().to(set_member_pending),
        )
        .route(
            "/chat-spaces/{chat_space_id}/members/{member_id}/disapprove",
            web::post().to(disapprove_member),
        )
        .route(
            "/chat-spaces/{chat_space_id}/members/{member_id}/upgrade",
            web::post().to(upgrade_member),
        )
        .route(
            "/chat-spaces/{chat_space_id}/members/{member_id}/downgrade",
            web::post().to(downgrade_member),
        )
        .route(
            "/chat-spaces/{chat_space_id}/members/{member_id}",
            web::delete().to(remove_member),
        );
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChatSpaceRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub visibility: ChatSpaceVisibility,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ModerationRequest {
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatSpaceResponse {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub visibility: ChatSpaceVisibility,
    pub is_active: bool,
    pub total_members: i64,
}

impl From<ChatSpace> for ChatSpaceResponse {
    fn from(chat_space: ChatSpace) -> Self {
        Self {
            id: chat_space.id,
            creator_id: chat_space.creator_id,
            name: chat_space.name,
            visibility: chat_space.visibility,
            is_active: chat_space.is_active,
            total_members: chat_space.total_members,
        }
    }
}

pub async fn create_chat_space(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<CreateChatSpaceRequest>,
) -> AppResult<HttpResponse> {
    let creator_id = extract_user_id(&req)?;
    payload.validate()?;
    let payload = payload.into_inner();

    let chat_space = state
        .chat_spaces
        .create_chat_space(creator_id, payload.name, payload.visibility)
        .await?;
    Ok(HttpResponse::Created().json(ChatSpaceResponse::from(chat_space)))
}

/// Caller's membership info for a chat space
pub async fn get_membership(
    req: HttpRequest,
    state: web::Data<AppState>,
    chat_space_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = extract_user_id(&req)?;
    let info = state
        .chat_spaces
        .membership_info(chat_space_id.into_inner(), user_id)
        .await?;
    Ok(HttpResponse::Ok().json(MembershipInfoResponse::from(info)))
}

pub async fn get_access(
    req: HttpRequest,
    state: web::Data<AppState>,
    chat_space_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = extract_user_id(&req)?;
    let allowed = state
        .chat_spaces
        .can_view_content(chat_space_id.into_inner(), user_id)
        .await?;
    Ok(HttpResponse::Ok().json(AccessResponse { allowed }))
}

pub async fn request_to_join(
    req: HttpRequest,
    state: web::Data<AppState>,
    chat_space_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = extract_user_id(&req)?;
    let info = state
        .chat_spaces
        .request_to_join(chat_space_id.into_inner(), user_id)
        .await?;
    Ok(HttpResponse::Ok().json(MembershipInfoResponse::from(info)))
}

pub async fn leave(
    req: HttpRequest,
    state: web::Data<AppState>,
    chat_space_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = extract_user_id(&req)?;
    let info = state
        .chat_spaces
        .leave(chat_space_id.into_inner(), user_id)
        .await?;
    Ok(HttpResponse::Ok().json(MembershipInfoResponse::from(info)))
}

pub async fn approve_member(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    payload: Option<web::Json<ModerationRequest>>,
) -> AppResult<HttpResponse> {
    let actor_id = extract_user_id(&req)?;
    let (chat_space_id, member_id) = path.into_inner();
    let payload = payload.map(|p| p.into_inner()).unwrap_or_default();
    payload.validate()?;

    let info = state
        .chat_spaces
        .approve_member(chat_space_id, actor_id, member_id, payload.comment)
        .await?;
    Ok(HttpResponse::Ok().json(MembershipInfoResponse::from(info)))
}

pub async fn set_member_pending(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    payload: Option<web::Json<ModerationRequest>>,
) -> AppResult<HttpResponse> {
    let actor_id = extract_user_id(&req)?;
    let (chat_space_id, member_id) = path.into_inner();
    let payload = payload.map(|p| p.into_inner()).unwrap_or_default();
    payload.validate()?;

    let info = state
        .chat_spaces
        .set_member_pending(chat_space_id, actor_id, member_id, payload.comment)
        .await?;
    Ok(HttpResponse::Ok().json(MembershipInfoResponse::from(info)))
}

pub async fn disapprove_member(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let actor_id = extract_user_id(&req)?;
    let (chat_space_id, member_id) = path.into_inner();
    let info = state
        .chat_spaces
        .disapprove_member(chat_space_id, actor_id, member_id)
        .await?;
    Ok(HttpResponse::Ok().json(MembershipInfoResponse::from(info)))
}

pub async fn upgrade_member(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let actor_id = extract_user_id(&req)?;
    let (chat_space_id, member_id) = path.into_inner();
    let info = state
        .chat_spaces
        .upgrade_member(chat_space_id, actor_id, member_id)
        .await?;
    Ok(HttpResponse::Ok().json(MembershipInfoResponse::from(info)))
}

pub async fn downgrade_member(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let actor_id = extract_user_id(&req)?;
    let (chat_space_id, member_id) = path.into_inner();
    let info = state
        .chat_spaces
        .downgrade_member(chat_space_id, actor_id, member_id)
        .await?;
    Ok(HttpResponse::Ok().json(MembershipInfoResponse::from(info)))
}

pub async fn remove_member(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let actor_id = extract_user_id(&req)?;
    let (chat_space_id, member_id) = path.into_inner();
    let info = state
        .chat_spaces
        .remove_member(chat_space_id, actor_id, member_id)
        .await?;
    Ok(HttpResponse::Ok().json(MembershipInfoResponse::from(info)))
}
