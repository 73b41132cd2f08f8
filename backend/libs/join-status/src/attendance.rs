//! Stream attendance lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::request::{RequestToJoinStatus, Transition};
use crate::status::JoinStatus;
use crate::stream::{resolve_stream, StreamJoinFacts};
use crate::visibility::{StreamVisibility, VisibilityClass};

/// Scheduled window of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSchedule {
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
}

impl StreamSchedule {
    pub fn new(scheduled_start: DateTime<Utc>, scheduled_end: DateTime<Utc>) -> Self {
        Self {
            scheduled_start,
            scheduled_end,
        }
    }

    /// `now` is strictly after the scheduled end
    pub fn has_happened(&self, now: DateTime<Utc>) -> bool {
        now > self.scheduled_end
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now >= self.scheduled_start && !self.has_happened(now)
    }
}

/// One (stream, member) attendee row.
///
/// `is_attending` is not checked against the request status: an attendee
/// still waiting for approval can be marked attending and the resolver
/// simply reports PENDING.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAttendance {
    pub id: Uuid,
    pub stream_id: Uuid,
    pub member_id: Uuid,
    pub request_status: RequestToJoinStatus,
    pub is_attending: bool,
    pub is_a_speaker: bool,
}

impl StreamAttendance {
    /// Row for a member asking to join. Public streams approve immediately;
    /// every other visibility waits for the organizer.
    pub fn request(stream_id: Uuid, member_id: Uuid, visibility: StreamVisibility) -> Self {
        let request_status = match visibility.class() {
            Some(VisibilityClass::Public) => RequestToJoinStatus::Approved,
            _ => RequestToJoinStatus::Pending,
        };
        Self {
            id: Uuid::new_v4(),
            stream_id,
            member_id,
            request_status,
            is_attending: true,
            is_a_speaker: false,
        }
    }

    /// Row for a member added by the organizer
    pub fn added_by_organizer(stream_id: Uuid, member_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            stream_id,
            member_id,
            request_status: RequestToJoinStatus::Approved,
            is_attending: true,
            is_a_speaker: false,
        }
    }

    pub fn approve(&mut self) -> Transition {
        self.request_status.approve()
    }

    pub fn set_pending(&mut self) -> Transition {
        self.request_status.set_pending()
    }

    pub fn disapprove(&mut self) -> Transition {
        self.request_status.disapprove()
    }

    pub fn set_attending(&mut self, attending: bool) {
        self.is_attending = attending;
    }

    pub fn set_speaker(&mut self, speaker: bool) {
        self.is_a_speaker = speaker;
    }

    pub fn join_facts(&self, visibility: StreamVisibility, has_happened: bool) -> StreamJoinFacts {
        StreamJoinFacts {
            request_status: self.request_status,
            visibility,
            has_happened,
            is_attending: self.is_attending,
        }
    }

    pub fn join_status(&self, visibility: StreamVisibility, has_happened: bool) -> JoinStatus {
        resolve_stream(self.join_facts(visibility, has_happened))
    }
}
