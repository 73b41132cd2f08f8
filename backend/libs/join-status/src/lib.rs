//! Membership and join-status resolution
//!
//! Pure decision logic shared by the stream-attendance and chat-space
//! membership flows. Callers load the facts (visibility, request status,
//! lifecycle flags, time) from storage and this crate turns them into a
//! single display/authorization [`JoinStatus`].
//!
//! Nothing in here performs I/O or holds shared state; every function is
//! safe to call from any number of tasks at once.

pub mod attendance;
pub mod chat_space;
pub mod info;
pub mod membership;
pub mod request;
pub mod rules;
pub mod status;
pub mod stream;
pub mod visibility;

pub use attendance::{StreamAttendance, StreamSchedule};
pub use chat_space::{explain_chat_space, resolve_chat_space, ChatSpaceJoinFacts};
pub use info::{
    assemble_attendance_info, assemble_membership_info, AttendanceInfo, ChatSpaceMembershipInfo,
};
pub use membership::{ChatSpaceMembership, LifecycleError, MemberRole, MembershipExitState};
pub use request::{RequestToJoinStatus, Transition};
pub use status::JoinStatus;
pub use stream::{explain_stream, resolve_stream, StreamJoinFacts};
pub use visibility::{ChatSpaceVisibility, StreamVisibility, VisibilityClass};
