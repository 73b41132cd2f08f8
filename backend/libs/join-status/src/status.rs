//! The derived join status
//!
//! Recomputed on every read, never stored. The engine only emits the tagged
//! value plus a stable message code; turning the code into display text for
//! a locale is the localization service's job.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::visibility::{ChatSpaceVisibility, VisibilityClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinStatus {
    Pending,
    Disapproved,
    JoinedStream,
    Attended,
    AttendingStream,
    NotAttendingStream,
    JoinedChatSpace,
    LeftChatSpace,
    RemovedChatSpace,
    NotJoinedPublic,
    NotJoinedPrivate,
}

impl JoinStatus {
    pub const ALL: [JoinStatus; 11] = [
        JoinStatus::Pending,
        JoinStatus::Disapproved,
        JoinStatus::JoinedStream,
        JoinStatus::Attended,
        JoinStatus::AttendingStream,
        JoinStatus::NotAttendingStream,
        JoinStatus::JoinedChatSpace,
        JoinStatus::LeftChatSpace,
        JoinStatus::RemovedChatSpace,
        JoinStatus::NotJoinedPublic,
        JoinStatus::NotJoinedPrivate,
    ];

    /// Status shown for a stream the caller has no attendee row for
    pub fn by_stream_visibility(is_private_or_protected: bool) -> Self {
        if is_private_or_protected {
            JoinStatus::NotJoinedPrivate
        } else {
            JoinStatus::NotJoinedPublic
        }
    }

    /// Status shown for a chat space the caller has no member row for
    pub fn by_chat_space_visibility(visibility: ChatSpaceVisibility) -> Self {
        match visibility.class() {
            VisibilityClass::Restricted => JoinStatus::NotJoinedPrivate,
            VisibilityClass::Public => JoinStatus::NotJoinedPublic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStatus::Pending => "PENDING",
            JoinStatus::Disapproved => "DISAPPROVED",
            JoinStatus::JoinedStream => "JOINED_STREAM",
            JoinStatus::Attended => "ATTENDED",
            JoinStatus::AttendingStream => "ATTENDING_STREAM",
            JoinStatus::NotAttendingStream => "NOT_ATTENDING_STREAM",
            JoinStatus::JoinedChatSpace => "JOINED_CHAT_SPACE",
            JoinStatus::LeftChatSpace => "LEFT_CHAT_SPACE",
            JoinStatus::RemovedChatSpace => "REMOVED_CHAT_SPACE",
            JoinStatus::NotJoinedPublic => "NOT_JOINED_PUBLIC",
            JoinStatus::NotJoinedPrivate => "NOT_JOINED_PRIVATE",
        }
    }

    /// Message catalog key handed to the localization service
    pub fn message_code(&self) -> &'static str {
        match self {
            JoinStatus::Pending => "join_status.pending",
            JoinStatus::Disapproved => "join_status.disapproved",
            JoinStatus::JoinedStream => "join_status.joined_stream",
            JoinStatus::Attended => "join_status.attended",
            JoinStatus::AttendingStream => "join_status.attending_stream",
            JoinStatus::NotAttendingStream => "join_status.not_attending_stream",
            JoinStatus::JoinedChatSpace => "join_status.joined_chat_space",
            JoinStatus::LeftChatSpace => "join_status.left_chat_space",
            JoinStatus::RemovedChatSpace => "join_status.removed_chat_space",
            JoinStatus::NotJoinedPublic => "join_status.not_joined_public",
            JoinStatus::NotJoinedPrivate => "join_status.not_joined_private",
        }
    }

    /// Whether the caller may see a stream's unmasked link or a chat
    /// space's restricted content.
    pub fn grants_access(&self) -> bool {
        matches!(
            self,
            JoinStatus::JoinedStream | JoinStatus::Attended | JoinStatus::JoinedChatSpace
        )
    }
}

impl fmt::Display for JoinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
