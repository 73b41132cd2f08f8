//! Join-status resolution for stream attendees
//!
//! Only applies when the caller has an attendee row. Without one, callers use
//! [`JoinStatus::by_stream_visibility`].

use crate::request::RequestToJoinStatus;
use crate::rules::{first_match, matching_rule, Rule};
use crate::status::JoinStatus;
use crate::visibility::{StreamVisibility, VisibilityClass};

/// Everything the stream resolver looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamJoinFacts {
    pub request_status: RequestToJoinStatus,
    pub visibility: StreamVisibility,
    /// Current time is strictly after the scheduled end
    pub has_happened: bool,
    pub is_attending: bool,
}

fn approved(f: &StreamJoinFacts) -> bool {
    f.request_status == RequestToJoinStatus::Approved
}

fn disapproved(f: &StreamJoinFacts) -> bool {
    f.request_status == RequestToJoinStatus::Disapproved
}

fn attended(f: &StreamJoinFacts) -> bool {
    approved(f) && f.is_attending && f.has_happened
}

fn approved_not_attending(f: &StreamJoinFacts) -> bool {
    approved(f) && !f.is_attending
}

// Rules 1 and 2 consume every other approved combination, so this only
// ever sees approved + attending + not yet happened.
fn approved_classified(f: &StreamJoinFacts) -> bool {
    approved(f) && f.visibility.class().is_some()
}

fn disapproved_restricted(f: &StreamJoinFacts) -> bool {
    f.visibility.class() == Some(VisibilityClass::Restricted) && disapproved(f)
}

fn disapproved_public(f: &StreamJoinFacts) -> bool {
    f.visibility.class() == Some(VisibilityClass::Public) && disapproved(f)
}

/// Stream decision table, first match wins.
///
/// 1. approved, attending, ended           -> ATTENDED
/// 2. approved, not attending              -> NOT_ATTENDING_STREAM
/// 3. approved, public or restricted       -> JOINED_STREAM
/// 4. restricted, disapproved              -> NOT_JOINED_PRIVATE
/// 5. public, disapproved                  -> NOT_JOINED_PUBLIC
/// otherwise                               -> PENDING
pub const STREAM_RULES: &[Rule<StreamJoinFacts>] = &[
    Rule {
        name: "approved_attended",
        when: attended,
        then: JoinStatus::Attended,
    },
    Rule {
        name: "approved_not_attending",
        when: approved_not_attending,
        then: JoinStatus::NotAttendingStream,
    },
    Rule {
        name: "approved_joined",
        when: approved_classified,
        then: JoinStatus::JoinedStream,
    },
    Rule {
        name: "disapproved_private",
        when: disapproved_restricted,
        then: JoinStatus::NotJoinedPrivate,
    },
    Rule {
        name: "disapproved_public",
        when: disapproved_public,
        then: JoinStatus::NotJoinedPublic,
    },
];

pub fn resolve_stream(facts: StreamJoinFacts) -> JoinStatus {
    first_match(STREAM_RULES, &facts, JoinStatus::Pending)
}

/// Name of the rule that decided `facts`, or `"fallback_pending"`
pub fn explain_stream(facts: &StreamJoinFacts) -> &'static str {
    matching_rule(STREAM_RULES, facts)
        .map(|rule| rule.name)
        .unwrap_or("fallback_pending")
}
