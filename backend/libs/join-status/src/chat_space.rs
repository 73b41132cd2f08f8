//! Join-status resolution for chat space members

use crate::membership::MembershipExitState;
use crate::request::RequestToJoinStatus;
use crate::rules::{first_match, matching_rule, Rule};
use crate::status::JoinStatus;
use crate::visibility::ChatSpaceVisibility;

/// Everything the chat space resolver looks at.
///
/// `exit` replaces the independent left/removed flags, so a member is
/// exactly one of active, left or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatSpaceJoinFacts {
    pub request_status: RequestToJoinStatus,
    pub visibility: ChatSpaceVisibility,
    pub exit: MembershipExitState,
}

impl ChatSpaceJoinFacts {
    pub fn is_member(&self) -> bool {
        self.exit == MembershipExitState::Active
    }

    pub fn is_removed(&self) -> bool {
        self.exit == MembershipExitState::Removed
    }

    pub fn has_left(&self) -> bool {
        self.exit == MembershipExitState::Left
    }
}

// Every ChatSpaceVisibility value is valid for the approved rules, so the
// visibility half of their guard is always satisfied.
fn approved(f: &ChatSpaceJoinFacts) -> bool {
    f.request_status == RequestToJoinStatus::Approved
}

fn approved_member(f: &ChatSpaceJoinFacts) -> bool {
    approved(f) && f.is_member()
}

fn approved_removed(f: &ChatSpaceJoinFacts) -> bool {
    approved(f) && f.is_removed()
}

fn approved_left(f: &ChatSpaceJoinFacts) -> bool {
    approved(f) && f.has_left()
}

fn disapproved_private(f: &ChatSpaceJoinFacts) -> bool {
    f.visibility == ChatSpaceVisibility::Private
        && f.request_status == RequestToJoinStatus::Disapproved
}

fn disapproved_public(f: &ChatSpaceJoinFacts) -> bool {
    f.visibility == ChatSpaceVisibility::Public
        && f.request_status == RequestToJoinStatus::Disapproved
}

/// Chat space decision table, first match wins.
///
/// 1. approved, active member  -> JOINED_CHAT_SPACE
/// 2. approved, removed        -> REMOVED_CHAT_SPACE
/// 3. approved, left           -> LEFT_CHAT_SPACE
/// 4. private, disapproved     -> NOT_JOINED_PRIVATE
/// 5. public, disapproved      -> NOT_JOINED_PUBLIC
/// otherwise                   -> PENDING
pub const CHAT_SPACE_RULES: &[Rule<ChatSpaceJoinFacts>] = &[
    Rule {
        name: "approved_member",
        when: approved_member,
        then: JoinStatus::JoinedChatSpace,
    },
    Rule {
        name: "approved_removed",
        when: approved_removed,
        then: JoinStatus::RemovedChatSpace,
    },
    Rule {
        name: "approved_left",
        when: approved_left,
        then: JoinStatus::LeftChatSpace,
    },
    Rule {
        name: "disapproved_private",
        when: disapproved_private,
        then: JoinStatus::NotJoinedPrivate,
    },
    Rule {
        name: "disapproved_public",
        when: disapproved_public,
        then: JoinStatus::NotJoinedPublic,
    },
];

pub fn resolve_chat_space(facts: ChatSpaceJoinFacts) -> JoinStatus {
    first_match(CHAT_SPACE_RULES, &facts, JoinStatus::Pending)
}

pub fn explain_chat_space(facts: &ChatSpaceJoinFacts) -> &'static str {
    matching_rule(CHAT_SPACE_RULES, facts)
        .map(|rule| rule.name)
        .unwrap_or("fallback_pending")
}
