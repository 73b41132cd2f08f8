//! Persistence seams for streams and chat spaces
//!
//! Rows reference streams, chat spaces and members by id only. Every write
//! that changes a counter (`total_attendees`, `total_members`) applies the
//! change as a set-based increment in the same transaction as the row
//! update, never by loading the aggregate and saving it back.

pub mod chat_spaces;
pub mod streams;

use async_trait::async_trait;
use join_status::{
    ChatSpaceMembership, ChatSpaceVisibility, LifecycleError, MemberRole, MembershipExitState,
    RequestToJoinStatus, StreamAttendance, Transition,
};
use uuid::Uuid;

use crate::domain::{ChatSpace, Stream};
use crate::error::AppResult;

pub use chat_spaces::PgChatSpaceRepository;
pub use streams::PgStreamRepository;

#[async_trait]
pub trait StreamStore: Send + Sync {
    async fn find_stream(&self, stream_id: Uuid) -> AppResult<Option<Stream>>;

    async fn find_attendee(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<StreamAttendance>>;

    /// Insert a new attendee row. Returns false when the (stream, member)
    /// pair already has one.
    async fn insert_attendee(&self, attendee: &StreamAttendance) -> AppResult<bool>;

    /// Organizer admission: the member ends up approved and attending,
    /// whether or not they had a row before. Returns the stored attendee.
    async fn admit_attendee(&self, attendee: &StreamAttendance) -> AppResult<StreamAttendance>;

    /// Move every listed attendee of the stream to `status` in one update.
    /// Returns the number of rows whose status actually changed.
    async fn set_request_status(
        &self,
        stream_id: Uuid,
        attendee_ids: &[Uuid],
        status: RequestToJoinStatus,
    ) -> AppResult<u64>;

    /// Returns false when the member has no attendee row
    async fn set_attending(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
        attending: bool,
    ) -> AppResult<bool>;

    async fn set_speakers(
        &self,
        stream_id: Uuid,
        attendee_ids: &[Uuid],
        is_speaker: bool,
    ) -> AppResult<u64>;
}

#[async_trait]
pub trait ChatSpaceStore: Send + Sync {
    /// Deleted chat spaces are never returned
    async fn find_chat_space(&self, chat_space_id: Uuid) -> AppResult<Option<ChatSpace>>;

    /// Create the space together with its creator's admin row
    async fn create_chat_space(
        &self,
        chat_space: &ChatSpace,
        creator: &ChatSpaceMembership,
    ) -> AppResult<()>;

    async fn find_member(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<ChatSpaceMembership>>;

    /// Returns false when the (chat space, member) pair already has a row
    async fn insert_member(&self, member: &ChatSpaceMembership) -> AppResult<bool>;

    /// Bring back a member who left. The row is locked and the lifecycle
    /// check runs against the locked state, so a concurrent removal wins.
    /// Removed and still-active rows come back as the lifecycle error with
    /// nothing written; a missing row is `MemberNotFound`.
    async fn rejoin_member(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        visibility: ChatSpaceVisibility,
    ) -> AppResult<Result<(ChatSpaceMembership, Transition), LifecycleError>>;

    /// Returns `None` when the row is missing
    async fn set_request_status(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        status: RequestToJoinStatus,
        comment: Option<String>,
    ) -> AppResult<Option<Transition>>;

    async fn set_role(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        role: MemberRole,
    ) -> AppResult<bool>;

    /// A row that is already removed stays removed. Returns false when the
    /// row is missing.
    async fn set_exit_state(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        exit: MembershipExitState,
    ) -> AppResult<bool>;

    /// Downgrade an admin or let them leave, but only while another
    /// approved, active admin remains. The admin rows stay locked between
    /// the count and the write. Returns false when `member_id` is the last
    /// admin; a missing row is `MemberNotFound`.
    async fn step_down_admin(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        step: AdminStepDown,
    ) -> AppResult<bool>;
}

/// How an admin gives up administering a chat space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStepDown {
    /// Stay a member with role MEMBER
    Downgrade,
    /// Leave the chat space
    Leave,
}
