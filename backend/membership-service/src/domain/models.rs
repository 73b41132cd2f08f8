use chrono::{DateTime, Utc};
use join_status::{
    ChatSpaceMembership, ChatSpaceVisibility, MemberRole, MembershipExitState,
    RequestToJoinStatus, StreamAttendance, StreamSchedule, StreamVisibility,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

// ============================================================================
// Streams
// ============================================================================

/// Stream aggregate as the service sees it. Visibility is always present and
/// typed; rows with unknown values are rejected when loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub visibility: StreamVisibility,
    pub schedule: StreamSchedule,
    pub total_attendees: i64,
}

impl Stream {
    pub fn has_happened(&self, now: DateTime<Utc>) -> bool {
        self.schedule.has_happened(now)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StreamRow {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub visibility: String,
    pub scheduled_start_date: DateTime<Utc>,
    pub scheduled_end_date: DateTime<Utc>,
    pub total_attendees: i64,
}

impl TryFrom<StreamRow> for Stream {
    type Error = AppError;

    fn try_from(row: StreamRow) -> Result<Self, Self::Error> {
        let visibility = StreamVisibility::from_db(&row.visibility).ok_or_else(|| {
            AppError::Internal(format!(
                "stream {} has unknown visibility {}",
                row.id, row.visibility
            ))
        })?;
        Ok(Stream {
            id: row.id,
            organizer_id: row.organizer_id,
            title: row.title,
            visibility,
            schedule: StreamSchedule::new(row.scheduled_start_date, row.scheduled_end_date),
            total_attendees: row.total_attendees,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StreamAttendeeRow {
    pub id: Uuid,
    pub stream_id: Uuid,
    pub member_id: Uuid,
    pub request_to_join_status: String,
    pub is_attending: bool,
    pub is_a_speaker: bool,
}

impl TryFrom<StreamAttendeeRow> for StreamAttendance {
    type Error = AppError;

    fn try_from(row: StreamAttendeeRow) -> Result<Self, Self::Error> {
        Ok(StreamAttendance {
            id: row.id,
            stream_id: row.stream_id,
            member_id: row.member_id,
            request_status: parse_request_status(&row.request_to_join_status)?,
            is_attending: row.is_attending,
            is_a_speaker: row.is_a_speaker,
        })
    }
}

// ============================================================================
// Chat spaces
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSpace {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub visibility: ChatSpaceVisibility,
    pub is_active: bool,
    pub is_deleted: bool,
    pub total_members: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatSpaceRow {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub visibility: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub total_members: i64,
}

impl TryFrom<ChatSpaceRow> for ChatSpace {
    type Error = AppError;

    fn try_from(row: ChatSpaceRow) -> Result<Self, Self::Error> {
        let visibility = ChatSpaceVisibility::from_db(&row.visibility).ok_or_else(|| {
            AppError::Internal(format!(
                "chat space {} has unknown visibility {}",
                row.id, row.visibility
            ))
        })?;
        Ok(ChatSpace {
            id: row.id,
            creator_id: row.creator_id,
            name: row.name,
            visibility,
            is_active: row.is_active,
            is_deleted: row.is_deleted,
            total_members: row.total_members,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatSpaceMemberRow {
    pub chat_space_id: Uuid,
    pub member_id: Uuid,
    pub request_to_join_status: String,
    pub role: String,
    pub is_left: bool,
    pub is_removed: bool,
    pub comment: Option<String>,
}

impl TryFrom<ChatSpaceMemberRow> for ChatSpaceMembership {
    type Error = AppError;

    fn try_from(row: ChatSpaceMemberRow) -> Result<Self, Self::Error> {
        let role = MemberRole::from_db(&row.role)
            .ok_or_else(|| AppError::Internal(format!("unknown member role {}", row.role)))?;
        Ok(ChatSpaceMembership {
            chat_space_id: row.chat_space_id,
            member_id: row.member_id,
            request_status: parse_request_status(&row.request_to_join_status)?,
            role,
            exit: MembershipExitState::from_flags(row.is_left, row.is_removed),
            comment: row.comment,
        })
    }
}

fn parse_request_status(value: &str) -> Result<RequestToJoinStatus, AppError> {
    RequestToJoinStatus::from_db(value)
        .ok_or_else(|| AppError::Internal(format!("unknown request-to-join status {}", value)))
}

/// Whether a member row counts towards `chat_spaces.total_members`
pub fn counts_as_member(status: RequestToJoinStatus, exit: MembershipExitState) -> bool {
    status.is_approved() && exit == MembershipExitState::Active
}

/// Change to apply to `total_members` when a row moves between states
pub fn member_count_delta(
    before: Option<(RequestToJoinStatus, MembershipExitState)>,
    after: (RequestToJoinStatus, MembershipExitState),
) -> i64 {
    let was = before
        .map(|(status, exit)| counts_as_member(status, exit))
        .unwrap_or(false);
    let is = counts_as_member(after.0, after.1);
    i64::from(is) - i64::from(was)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_row_with_both_flags_is_removed() {
        let row = ChatSpaceMemberRow {
            chat_space_id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            request_to_join_status: "APPROVED".into(),
            role: "MEMBER".into(),
            is_left: true,
            is_removed: true,
            comment: None,
        };
        let member = ChatSpaceMembership::try_from(row).unwrap();
        assert_eq!(member.exit, MembershipExitState::Removed);
    }

    #[test]
    fn test_unknown_visibility_rejected() {
        let row = StreamRow {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: "t".into(),
            visibility: "SECRET".into(),
            scheduled_start_date: Utc::now(),
            scheduled_end_date: Utc::now(),
            total_attendees: 0,
        };
        assert!(Stream::try_from(row).is_err());
    }

    #[test]
    fn test_member_count_delta() {
        use MembershipExitState::*;
        use RequestToJoinStatus::*;

        assert_eq!(member_count_delta(None, (Approved, Active)), 1);
        assert_eq!(member_count_delta(None, (Pending, Active)), 0);
        assert_eq!(member_count_delta(Some((Pending, Active)), (Approved, Active)), 1);
        assert_eq!(member_count_delta(Some((Approved, Active)), (Approved, Left)), -1);
        assert_eq!(member_count_delta(Some((Approved, Left)), (Approved, Removed)), 0);
        assert_eq!(member_count_delta(Some((Approved, Active)), (Approved, Active)), 0);
    }
}
