//! Request-to-join lifecycle shared by stream attendees and chat space members
//!
//! PENDING -> APPROVED | DISAPPROVED. Organizers and admins may also move a
//! row back to PENDING or re-approve it; none of the transitions are guarded.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestToJoinStatus {
    Pending,
    Approved,
    Disapproved,
}

/// Result of applying a transition, kept for logging and counter updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RequestToJoinStatus,
    pub to: RequestToJoinStatus,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// The row became approved with this transition
    pub fn newly_approved(&self) -> bool {
        self.changed() && self.to == RequestToJoinStatus::Approved
    }

    /// The row stopped being approved with this transition
    pub fn lost_approval(&self) -> bool {
        self.changed() && self.from == RequestToJoinStatus::Approved
    }
}

impl RequestToJoinStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "DISAPPROVED" => Some(Self::Disapproved),
            _ => None,
        }
    }

    pub fn to_db(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Disapproved => "DISAPPROVED",
        }
    }

    pub fn is_approved(&self) -> bool {
        *self == Self::Approved
    }

    pub fn approve(&mut self) -> Transition {
        self.move_to(Self::Approved)
    }

    pub fn set_pending(&mut self) -> Transition {
        self.move_to(Self::Pending)
    }

    pub fn disapprove(&mut self) -> Transition {
        self.move_to(Self::Disapproved)
    }

    fn move_to(&mut self, to: Self) -> Transition {
        let from = *self;
        *self = to;
        Transition { from, to }
    }
}

impl fmt::Display for RequestToJoinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db())
    }
}

impl std::str::FromStr for RequestToJoinStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db(s).ok_or_else(|| format!("Invalid request-to-join status: {}", s))
    }
}
