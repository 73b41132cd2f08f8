use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{extract_user_id, AccessResponse, AttendanceInfoResponse, BulkUpdateResponse};
use crate::error::AppResult;
use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/streams/{stream_id}/attendance",
        web::get().to(get_attendance),
    )
    .route("/streams/{stream_id}/access", web::get().to(get_access))
    .route("/streams/{stream_id}/join", web::post().to(request_to_join))
    .route(
        "/streams/{stream_id}/attending",
        web::put().to(set_attending),
    )
    .route(
        "/streams/{stream_id}/attendees/{member_id}",
        web::put().to(add_attendee),
    )
    .route(
        "/streams/{stream_id}/attendees/approve",
        web::post().to(approve_attendees),
    )
    .route(
        "/streams/{stream_id}/attendees/disapprove",
        web::post().to(disapprove_attendees),
    )
    .route("/streams/{stream_id}/speakers", web::post().to(mark_speakers));
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkAttendeesRequest {
    #[validate(length(min = 1, max = 500))]
    pub attendee_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MarkSpeakersRequest {
    #[validate(length(min = 1, max = 500))]
    pub attendee_ids: Vec<Uuid>,
    pub is_speaker: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetAttendingRequest {
    pub attending: bool,
}

/// Caller's attendance info for a stream
pub async fn get_attendance(
    req: HttpRequest,
    state: web::Data<AppState>,
    stream_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = extract_user_id(&req)?;
    let info = state
        .streams
        .attendance_info(stream_id.into_inner(), user_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(AttendanceInfoResponse::from(info)))
}

/// Whether the caller may see the unmasked stream link
pub async fn get_access(
    req: HttpRequest,
    state: web::Data<AppState>,
    stream_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = extract_user_id(&req)?;
    let allowed = state
        .streams
        .can_view_access_link(stream_id.into_inner(), user_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(AccessResponse { allowed }))
}

pub async fn request_to_join(
    req: HttpRequest,
    state: web::Data<AppState>,
    stream_id: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user_id = extract_user_id(&req)?;
    let info = state
        .streams
        .request_to_join(stream_id.into_inner(), user_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(AttendanceInfoResponse::from(info)))
}

pub async fn set_attending(
    req: HttpRequest,
    state: web::Data<AppState>,
    stream_id: web::Path<Uuid>,
    payload: web::Json<SetAttendingRequest>,
) -> AppResult<HttpResponse> {
    let user_id = extract_user_id(&req)?;
    let info = state
        .streams
        .set_attending(stream_id.into_inner(), user_id, payload.attending, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(AttendanceInfoResponse::from(info)))
}

/// Organizer adds a member directly
pub async fn add_attendee(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let organizer_id = extract_user_id(&req)?;
    let (stream_id, member_id) = path.into_inner();
    let info = state
        .streams
        .add_attendee(stream_id, organizer_id, member_id, Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(AttendanceInfoResponse::from(info)))
}

pub async fn approve_attendees(
    req: HttpRequest,
    state: web::Data<AppState>,
    stream_id: web::Path<Uuid>,
    payload: web::Json<BulkAttendeesRequest>,
) -> AppResult<HttpResponse> {
    let organizer_id = extract_user_id(&req)?;
    payload.validate()?;
    let updated = state
        .streams
        .approve_attendees(stream_id.into_inner(), organizer_id, &payload.attendee_ids)
        .await?;
    Ok(HttpResponse::Ok().json(BulkUpdateResponse { updated }))
}

pub async fn disapprove_attendees(
    req: HttpRequest,
    state: web::Data<AppState>,
    stream_id: web::Path<Uuid>,
    payload: web::Json<BulkAttendeesRequest>,
) -> AppResult<HttpResponse> {
    let organizer_id = extract_user_id(&req)?;
    payload.validate()?;
    let updated = state
        .streams
        .disapprove_attendees(stream_id.into_inner(), organizer_id, &payload.attendee_ids)
        .await?;
    Ok(HttpResponse::Ok().json(BulkUpdateResponse { updated }))
}

pub async fn mark_speakers(
    req: HttpRequest,
    state: web::Data<AppState>,
    stream_id: web::Path<Uuid>,
    payload: web::Json<MarkSpeakersRequest>,
) -> AppResult<HttpResponse> {
    let organizer_id = extract_user_id(&req)?;
    payload.validate()?;
    let updated = state
        .streams
        .mark_speakers(
            stream_id.into_inner(),
            organizer_id,
            &payload.attendee_ids,
            payload.is_speaker,
        )
        .await?;
    Ok(HttpResponse::Ok().json(BulkUpdateResponse { updated }))
}
