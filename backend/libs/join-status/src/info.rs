//! Response-ready bundles of a resolved status and its sibling facts
//!
//! Assembly never fails. Missing status inputs produce the default value,
//! which means "unknown state" and is not an error.

use serde::{Deserialize, Serialize};

use crate::membership::{MemberRole, MembershipExitState};
use crate::request::RequestToJoinStatus;
use crate::status::JoinStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceInfo {
    pub request_to_join_status: Option<RequestToJoinStatus>,
    pub join_status: Option<JoinStatus>,
    pub is_attending: bool,
    pub is_a_speaker: bool,
}

impl AttendanceInfo {
    /// Caller has no attendee row for the stream
    pub fn not_joined(join_status: JoinStatus) -> Self {
        Self {
            join_status: Some(join_status),
            ..Self::default()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.join_status.is_none()
    }

    pub fn grants_access(&self) -> bool {
        self.join_status.map(|s| s.grants_access()).unwrap_or(false)
    }
}

pub fn assemble_attendance_info(
    request_to_join_status: Option<RequestToJoinStatus>,
    join_status: Option<JoinStatus>,
    is_attending: bool,
    is_a_speaker: Option<bool>,
) -> AttendanceInfo {
    match (request_to_join_status, join_status) {
        (Some(request_to_join_status), Some(join_status)) => AttendanceInfo {
            request_to_join_status: Some(request_to_join_status),
            join_status: Some(join_status),
            is_attending,
            is_a_speaker: is_a_speaker.unwrap_or(false),
        },
        _ => AttendanceInfo::default(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatSpaceMembershipInfo {
    pub request_to_join_status: Option<RequestToJoinStatus>,
    pub join_status: Option<JoinStatus>,
    pub role: Option<MemberRole>,
    pub exit: Option<MembershipExitState>,
}

impl ChatSpaceMembershipInfo {
    /// Caller has no member row for the chat space
    pub fn not_joined(join_status: JoinStatus) -> Self {
        Self {
            join_status: Some(join_status),
            ..Self::default()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.join_status.is_none()
    }

    pub fn grants_access(&self) -> bool {
        self.join_status.map(|s| s.grants_access()).unwrap_or(false)
    }
}

pub fn assemble_membership_info(
    request_to_join_status: Option<RequestToJoinStatus>,
    join_status: Option<JoinStatus>,
    role: Option<MemberRole>,
    exit: MembershipExitState,
) -> ChatSpaceMembershipInfo {
    match (request_to_join_status, join_status) {
        (Some(request_to_join_status), Some(join_status)) => ChatSpaceMembershipInfo {
            request_to_join_status: Some(request_to_join_status),
            join_status: Some(join_status),
            role,
            exit: Some(exit),
        },
        _ => ChatSpaceMembershipInfo::default(),
    }
}
