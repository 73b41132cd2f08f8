//! Chat space membership lifecycle
//!
//! A member row carries a request-to-join status, a role, and an exit
//! state. Admin actions on the request status are unconditional; keeping at
//! least one admin in a space is the caller's job.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::chat_space::{resolve_chat_space, ChatSpaceJoinFacts};
use crate::request::{RequestToJoinStatus, Transition};
use crate::status::JoinStatus;
use crate::visibility::{ChatSpaceVisibility, VisibilityClass};

/// Member role in a chat space, ordered Member < Admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Member,
    Admin,
}

impl MemberRole {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "MEMBER" => Some(Self::Member),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn to_db(&self) -> &'static str {
        match self {
            Self::Member => "MEMBER",
            Self::Admin => "ADMIN",
        }
    }

    pub fn is_admin(&self) -> bool {
        *self == Self::Admin
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db())
    }
}

impl std::str::FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db(s).ok_or_else(|| format!("Invalid role: {}", s))
    }
}

/// Whether a member is still in the space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipExitState {
    #[default]
    Active,
    /// Left voluntarily
    Left,
    /// Removed by an admin
    Removed,
}

impl MembershipExitState {
    /// Collapse the stored `left`/`removed` columns. Removal wins when both
    /// are set.
    pub fn from_flags(left: bool, removed: bool) -> Self {
        if removed {
            Self::Removed
        } else if left {
            Self::Left
        } else {
            Self::Active
        }
    }

    /// Inverse of [`from_flags`](Self::from_flags): `(left, removed)`
    pub fn to_flags(&self) -> (bool, bool) {
        match self {
            Self::Active => (false, false),
            Self::Left => (true, false),
            Self::Removed => (false, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("member was removed from the chat space")]
    Removed,

    #[error("member is still active in the chat space")]
    StillActive,
}

/// One (chat space, member) row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSpaceMembership {
    pub chat_space_id: Uuid,
    pub member_id: Uuid,
    pub request_status: RequestToJoinStatus,
    pub role: MemberRole,
    pub exit: MembershipExitState,
    /// Note left by the admin on the last approve / set-pending
    pub comment: Option<String>,
}

impl ChatSpaceMembership {
    fn new(
        chat_space_id: Uuid,
        member_id: Uuid,
        request_status: RequestToJoinStatus,
        role: MemberRole,
    ) -> Self {
        Self {
            chat_space_id,
            member_id,
            request_status,
            role,
            exit: MembershipExitState::Active,
            comment: None,
        }
    }

    /// Row for the user creating the space
    pub fn creator(chat_space_id: Uuid, member_id: Uuid) -> Self {
        Self::new(
            chat_space_id,
            member_id,
            RequestToJoinStatus::Approved,
            MemberRole::Admin,
        )
    }

    /// Row for a user added through an invitation; auto-approved
    pub fn invited(chat_space_id: Uuid, member_id: Uuid) -> Self {
        Self::new(
            chat_space_id,
            member_id,
            RequestToJoinStatus::Approved,
            MemberRole::Member,
        )
    }

    /// Row for a user asking to join. Public spaces approve immediately.
    pub fn request(chat_space_id: Uuid, member_id: Uuid, visibility: ChatSpaceVisibility) -> Self {
        Self::new(
            chat_space_id,
            member_id,
            initial_status(visibility),
            MemberRole::Member,
        )
    }

    pub fn approve(&mut self, comment: Option<String>) -> Transition {
        self.comment = comment;
        self.request_status.approve()
    }

    pub fn set_pending(&mut self, comment: Option<String>) -> Transition {
        self.comment = comment;
        self.request_status.set_pending()
    }

    pub fn disapprove(&mut self) -> Transition {
        self.request_status.disapprove()
    }

    pub fn upgrade(&mut self) {
        self.role = MemberRole::Admin;
    }

    pub fn downgrade(&mut self) {
        self.role = MemberRole::Member;
    }

    /// Leave voluntarily. A removed member stays removed.
    pub fn leave(&mut self) {
        if self.exit != MembershipExitState::Removed {
            self.exit = MembershipExitState::Left;
        }
    }

    pub fn remove(&mut self) {
        self.exit = MembershipExitState::Removed;
    }

    /// Come back after leaving. The request status restarts as for a new
    /// request and any admin role is dropped.
    pub fn rejoin(&mut self, visibility: ChatSpaceVisibility) -> Result<Transition, LifecycleError> {
        match self.exit {
            MembershipExitState::Removed => Err(LifecycleError::Removed),
            MembershipExitState::Active => Err(LifecycleError::StillActive),
            MembershipExitState::Left => {
                self.exit = MembershipExitState::Active;
                self.role = MemberRole::Member;
                self.comment = None;
                let from = self.request_status;
                self.request_status = initial_status(visibility);
                Ok(Transition {
                    from,
                    to: self.request_status,
                })
            }
        }
    }

    /// Approved, active admin
    pub fn can_administer(&self) -> bool {
        self.role.is_admin()
            && self.request_status.is_approved()
            && self.exit == MembershipExitState::Active
    }

    pub fn join_facts(&self, visibility: ChatSpaceVisibility) -> ChatSpaceJoinFacts {
        ChatSpaceJoinFacts {
            request_status: self.request_status,
            visibility,
            exit: self.exit,
        }
    }

    pub fn join_status(&self, visibility: ChatSpaceVisibility) -> JoinStatus {
        resolve_chat_space(self.join_facts(visibility))
    }
}

fn initial_status(visibility: ChatSpaceVisibility) -> RequestToJoinStatus {
    match visibility.class() {
        VisibilityClass::Public => RequestToJoinStatus::Approved,
        VisibilityClass::Restricted => RequestToJoinStatus::Pending,
    }
}
