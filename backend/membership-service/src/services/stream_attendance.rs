//! Stream attendance flow
//!
//! Loads the stream and the caller's attendee row, resolves the join status
//! and bundles it for the response.

use chrono::{DateTime, Utc};
use join_status::{
    assemble_attendance_info, explain_stream, resolve_stream, AttendanceInfo, JoinStatus,
    RequestToJoinStatus, StreamAttendance,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::Stream;
use crate::error::{AppError, AppResult};
use crate::metrics::{record_resolution, ResolutionKind};
use crate::repository::StreamStore;

#[derive(Clone)]
pub struct StreamAttendanceService {
    store: Arc<dyn StreamStore>,
    max_bulk_ids: usize,
}

impl StreamAttendanceService {
    pub fn new(store: Arc<dyn StreamStore>, max_bulk_ids: usize) -> Self {
        Self {
            store,
            max_bulk_ids,
        }
    }

    /// Resolve `member_id`'s status for a loaded stream at `now`
    pub fn resolve(
        stream: &Stream,
        attendee: Option<&StreamAttendance>,
        now: DateTime<Utc>,
    ) -> AttendanceInfo {
        let Some(attendee) = attendee else {
            let status = JoinStatus::by_stream_visibility(stream.visibility.is_private_or_protected());
            record_resolution(ResolutionKind::Stream, status);
            return AttendanceInfo::not_joined(status);
        };

        let facts = attendee.join_facts(stream.visibility, stream.has_happened(now));
        let status = resolve_stream(facts);
        debug!(
            stream_id = %stream.id,
            member_id = %attendee.member_id,
            rule = explain_stream(&facts),
            status = %status,
            "resolved stream join status"
        );
        record_resolution(ResolutionKind::Stream, status);

        assemble_attendance_info(
            Some(attendee.request_status),
            Some(status),
            attendee.is_attending,
            Some(attendee.is_a_speaker),
        )
    }

    pub async fn attendance_info(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<AttendanceInfo> {
        let stream = self.load_stream(stream_id).await?;
        let attendee = self.store.find_attendee(stream_id, member_id).await?;
        Ok(Self::resolve(&stream, attendee.as_ref(), now))
    }

    /// Organizers always see the link; everyone else needs a granting status
    pub async fn can_view_access_link(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let stream = self.load_stream(stream_id).await?;
        if stream.organizer_id == member_id {
            return Ok(true);
        }
        let attendee = self.store.find_attendee(stream_id, member_id).await?;
        Ok(Self::resolve(&stream, attendee.as_ref(), now).grants_access())
    }

    /// Ask to join. Idempotent: an existing row is returned as is.
    pub async fn request_to_join(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<AttendanceInfo> {
        let stream = self.load_stream(stream_id).await?;

        if let Some(existing) = self.store.find_attendee(stream_id, member_id).await? {
            return Ok(Self::resolve(&stream, Some(&existing), now));
        }

        let attendee = StreamAttendance::request(stream_id, member_id, stream.visibility);
        if self.store.insert_attendee(&attendee).await? {
            info!(
                stream_id = %stream_id,
                member_id = %member_id,
                status = %attendee.request_status,
                "member requested to join stream"
            );
            return Ok(Self::resolve(&stream, Some(&attendee), now));
        }

        // Lost a race with a concurrent request for the same pair
        let existing = self.require_attendee(stream_id, member_id).await?;
        Ok(Self::resolve(&stream, Some(&existing), now))
    }

    /// Organizer adds a member directly. An existing row is approved and
    /// marked attending again, so an earlier opt-out does not hide the link.
    pub async fn add_attendee(
        &self,
        stream_id: Uuid,
        organizer_id: Uuid,
        member_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<AttendanceInfo> {
        let stream = self.load_stream(stream_id).await?;
        Self::require_organizer(&stream, organizer_id)?;

        let attendee = self
            .store
            .admit_attendee(&StreamAttendance::added_by_organizer(stream_id, member_id))
            .await?;

        info!(stream_id = %stream_id, member_id = %member_id, "organizer added attendee");
        Ok(Self::resolve(&stream, Some(&attendee), now))
    }

    pub async fn approve_attendees(
        &self,
        stream_id: Uuid,
        organizer_id: Uuid,
        attendee_ids: &[Uuid],
    ) -> AppResult<u64> {
        self.bulk_status(stream_id, organizer_id, attendee_ids, RequestToJoinStatus::Approved)
            .await
    }

    pub async fn disapprove_attendees(
        &self,
        stream_id: Uuid,
        organizer_id: Uuid,
        attendee_ids: &[Uuid],
    ) -> AppResult<u64> {
        self.bulk_status(
            stream_id,
            organizer_id,
            attendee_ids,
            RequestToJoinStatus::Disapproved,
        )
        .await
    }

    /// Toggle the caller's own attendance
    pub async fn set_attending(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
        attending: bool,
        now: DateTime<Utc>,
    ) -> AppResult<AttendanceInfo> {
        let stream = self.load_stream(stream_id).await?;
        if !self
            .store
            .set_attending(stream_id, member_id, attending)
            .await?
        {
            return Err(AppError::AttendeeNotFound {
                stream_id,
                member_id,
            });
        }
        let attendee = self.require_attendee(stream_id, member_id).await?;
        Ok(Self::resolve(&stream, Some(&attendee), now))
    }

    pub async fn mark_speakers(
        &self,
        stream_id: Uuid,
        organizer_id: Uuid,
        attendee_ids: &[Uuid],
        is_speaker: bool,
    ) -> AppResult<u64> {
        let stream = self.load_stream(stream_id).await?;
        Self::require_organizer(&stream, organizer_id)?;
        self.check_bulk_size(attendee_ids)?;

        let updated = self
            .store
            .set_speakers(stream_id, attendee_ids, is_speaker)
            .await?;
        info!(stream_id = %stream_id, is_speaker, updated, "speaker flags updated");
        Ok(updated)
    }

    async fn bulk_status(
        &self,
        stream_id: Uuid,
        organizer_id: Uuid,
        attendee_ids: &[Uuid],
        status: RequestToJoinStatus,
    ) -> AppResult<u64> {
        let stream = self.load_stream(stream_id).await?;
        Self::require_organizer(&stream, organizer_id)?;
        self.check_bulk_size(attendee_ids)?;

        let updated = self
            .store
            .set_request_status(stream_id, attendee_ids, status)
            .await?;
        info!(
            stream_id = %stream_id,
            status = %status,
            requested = attendee_ids.len(),
            updated,
            "bulk request status change"
        );
        Ok(updated)
    }

    fn check_bulk_size(&self, ids: &[Uuid]) -> AppResult<()> {
        if ids.is_empty() {
            return Err(AppError::BadRequest("attendee_ids must not be empty".into()));
        }
        if ids.len() > self.max_bulk_ids {
            return Err(AppError::BadRequest(format!(
                "at most {} attendee ids per request",
                self.max_bulk_ids
            )));
        }
        Ok(())
    }

    fn require_organizer(stream: &Stream, actor_id: Uuid) -> AppResult<()> {
        if stream.organizer_id != actor_id {
            return Err(AppError::NotOrganizer);
        }
        Ok(())
    }

    async fn load_stream(&self, stream_id: Uuid) -> AppResult<Stream> {
        self.store
            .find_stream(stream_id)
            .await?
            .ok_or(AppError::StreamNotFound(stream_id))
    }

    async fn require_attendee(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<StreamAttendance> {
        self.store
            .find_attendee(stream_id, member_id)
            .await?
            .ok_or(AppError::AttendeeNotFound {
                stream_id,
                member_id,
            })
    }
}
