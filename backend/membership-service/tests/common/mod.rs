//! In-memory stores for service and HTTP tests
//!
//! Mirror the counter semantics of the PostgreSQL repositories without a
//! database so the flows can run in isolation.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use join_status::{
    ChatSpaceMembership, ChatSpaceVisibility, LifecycleError, MemberRole, MembershipExitState,
    RequestToJoinStatus, StreamAttendance, StreamSchedule, StreamVisibility, Transition,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use membership_service::domain::models::member_count_delta;
use membership_service::domain::{ChatSpace, Stream};
use membership_service::error::{AppError, AppResult};
use membership_service::repository::{AdminStepDown, ChatSpaceStore, StreamStore};
use membership_service::state::AppState;

pub const MAX_BULK_IDS: usize = 500;

/// Stream that ends in an hour
pub fn upcoming_stream(visibility: StreamVisibility) -> Stream {
    let start = Utc::now() + Duration::minutes(5);
    Stream {
        id: Uuid::new_v4(),
        organizer_id: Uuid::new_v4(),
        title: "Rust async deep dive".into(),
        visibility,
        schedule: StreamSchedule::new(start, start + Duration::hours(1)),
        total_attendees: 0,
    }
}

/// Stream that ended yesterday
pub fn past_stream(visibility: StreamVisibility) -> Stream {
    let start = Utc::now() - Duration::days(1);
    Stream {
        schedule: StreamSchedule::new(start, start + Duration::hours(1)),
        ..upcoming_stream(visibility)
    }
}

#[derive(Clone, Default)]
pub struct MockStreamStore {
    streams: Arc<Mutex<HashMap<Uuid, Stream>>>,
    attendees: Arc<Mutex<HashMap<(Uuid, Uuid), StreamAttendance>>>,
}

impl MockStreamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stream(&self, stream: Stream) {
        self.streams.lock().unwrap().insert(stream.id, stream);
    }

    pub fn total_attendees(&self, stream_id: Uuid) -> i64 {
        self.streams
            .lock()
            .unwrap()
            .get(&stream_id)
            .map(|s| s.total_attendees)
            .unwrap_or_default()
    }

    pub fn attendee(&self, stream_id: Uuid, member_id: Uuid) -> Option<StreamAttendance> {
        self.attendees
            .lock()
            .unwrap()
            .get(&(stream_id, member_id))
            .cloned()
    }

    fn bump(&self, stream_id: Uuid, delta: i64) {
        if let Some(stream) = self.streams.lock().unwrap().get_mut(&stream_id) {
            stream.total_attendees = (stream.total_attendees + delta).max(0);
        }
    }
}

#[async_trait]
impl StreamStore for MockStreamStore {
    async fn find_stream(&self, stream_id: Uuid) -> AppResult<Option<Stream>> {
        Ok(self.streams.lock().unwrap().get(&stream_id).cloned())
    }

    async fn find_attendee(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<StreamAttendance>> {
        Ok(self.attendee(stream_id, member_id))
    }

    async fn insert_attendee(&self, attendee: &StreamAttendance) -> AppResult<bool> {
        let inserted = {
            let mut attendees = self.attendees.lock().unwrap();
            let key = (attendee.stream_id, attendee.member_id);
            if attendees.contains_key(&key) {
                false
            } else {
                attendees.insert(key, attendee.clone());
                true
            }
        };
        if inserted && attendee.request_status.is_approved() {
            self.bump(attendee.stream_id, 1);
        }
        Ok(inserted)
    }

    async fn admit_attendee(&self, attendee: &StreamAttendance) -> AppResult<StreamAttendance> {
        let (stored, newly_approved) = {
            let mut attendees = self.attendees.lock().unwrap();
            match attendees.get_mut(&(attendee.stream_id, attendee.member_id)) {
                Some(existing) => {
                    let transition = existing.approve();
                    existing.set_attending(true);
                    (existing.clone(), transition.newly_approved())
                }
                None => {
                    attendees.insert((attendee.stream_id, attendee.member_id), attendee.clone());
                    (attendee.clone(), attendee.request_status.is_approved())
                }
            }
        };
        if newly_approved {
            self.bump(attendee.stream_id, 1);
        }
        Ok(stored)
    }

    async fn set_request_status(
        &self,
        stream_id: Uuid,
        attendee_ids: &[Uuid],
        status: RequestToJoinStatus,
    ) -> AppResult<u64> {
        let mut updated = 0;
        let mut delta = 0;
        {
            let mut attendees = self.attendees.lock().unwrap();
            for attendee in attendees.values_mut() {
                if attendee.stream_id != stream_id
                    || !attendee_ids.contains(&attendee.id)
                    || attendee.request_status == status
                {
                    continue;
                }
                let transition = Transition {
                    from: attendee.request_status,
                    to: status,
                };
                attendee.request_status = status;
                updated += 1;
                if transition.newly_approved() {
                    delta += 1;
                } else if transition.lost_approval() {
                    delta -= 1;
                }
            }
        }
        self.bump(stream_id, delta);
        Ok(updated)
    }

    async fn set_attending(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
        attending: bool,
    ) -> AppResult<bool> {
        let mut attendees = self.attendees.lock().unwrap();
        match attendees.get_mut(&(stream_id, member_id)) {
            Some(attendee) => {
                attendee.set_attending(attending);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_speakers(
        &self,
        stream_id: Uuid,
        attendee_ids: &[Uuid],
        is_speaker: bool,
    ) -> AppResult<u64> {
        let mut attendees = self.attendees.lock().unwrap();
        let mut updated = 0;
        for attendee in attendees.values_mut() {
            if attendee.stream_id == stream_id
                && attendee_ids.contains(&attendee.id)
                && attendee.is_a_speaker != is_speaker
            {
                attendee.set_speaker(is_speaker);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[derive(Clone, Default)]
pub struct MockChatSpaceStore {
    chat_spaces: Arc<Mutex<HashMap<Uuid, ChatSpace>>>,
    members: Arc<Mutex<HashMap<(Uuid, Uuid), ChatSpaceMembership>>>,
}

impl MockChatSpaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a space and its creator row without going through the service
    pub fn add_chat_space(&self, visibility: ChatSpaceVisibility) -> ChatSpace {
        let chat_space = ChatSpace {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            name: "rustaceans".into(),
            visibility,
            is_active: true,
            is_deleted: false,
            total_members: 1,
        };
        self.chat_spaces
            .lock()
            .unwrap()
            .insert(chat_space.id, chat_space.clone());
        self.members.lock().unwrap().insert(
            (chat_space.id, chat_space.creator_id),
            ChatSpaceMembership::creator(chat_space.id, chat_space.creator_id),
        );
        chat_space
    }

    /// Write an exit state directly, as another request would
    pub fn force_exit(&self, chat_space_id: Uuid, member_id: Uuid, exit: MembershipExitState) {
        if let Some(member) = self.members.lock().unwrap().get_mut(&(chat_space_id, member_id)) {
            member.exit = exit;
        }
    }

    pub fn force_role(&self, chat_space_id: Uuid, member_id: Uuid, role: MemberRole) {
        if let Some(member) = self.members.lock().unwrap().get_mut(&(chat_space_id, member_id)) {
            member.role = role;
        }
    }

    pub fn admin_count(&self, chat_space_id: Uuid) -> usize {
        self.members
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.chat_space_id == chat_space_id && m.can_administer())
            .count()
    }

    pub fn deactivate(&self, chat_space_id: Uuid) {
        if let Some(space) = self.chat_spaces.lock().unwrap().get_mut(&chat_space_id) {
            space.is_active = false;
        }
    }

    pub fn total_members(&self, chat_space_id: Uuid) -> i64 {
        self.chat_spaces
            .lock()
            .unwrap()
            .get(&chat_space_id)
            .map(|s| s.total_members)
            .unwrap_or_default()
    }

    pub fn member(&self, chat_space_id: Uuid, member_id: Uuid) -> Option<ChatSpaceMembership> {
        self.members
            .lock()
            .unwrap()
            .get(&(chat_space_id, member_id))
            .cloned()
    }

    fn bump(&self, chat_space_id: Uuid, delta: i64) {
        if let Some(space) = self.chat_spaces.lock().unwrap().get_mut(&chat_space_id) {
            space.total_members = (space.total_members + delta).max(0);
        }
    }
}

#[async_trait]
impl ChatSpaceStore for MockChatSpaceStore {
    async fn find_chat_space(&self, chat_space_id: Uuid) -> AppResult<Option<ChatSpace>> {
        Ok(self
            .chat_spaces
            .lock()
            .unwrap()
            .get(&chat_space_id)
            .filter(|s| !s.is_deleted)
            .cloned())
    }

    async fn create_chat_space(
        &self,
        chat_space: &ChatSpace,
        creator: &ChatSpaceMembership,
    ) -> AppResult<()> {
        let mut stored = chat_space.clone();
        stored.total_members = 1;
        self.chat_spaces.lock().unwrap().insert(stored.id, stored);
        self.members
            .lock()
            .unwrap()
            .insert((creator.chat_space_id, creator.member_id), creator.clone());
        Ok(())
    }

    async fn find_member(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<ChatSpaceMembership>> {
        Ok(self.member(chat_space_id, member_id))
    }

    async fn insert_member(&self, member: &ChatSpaceMembership) -> AppResult<bool> {
        let inserted = {
            let mut members = self.members.lock().unwrap();
            let key = (member.chat_space_id, member.member_id);
            if members.contains_key(&key) {
                false
            } else {
                members.insert(key, member.clone());
                true
            }
        };
        if inserted {
            let delta = member_count_delta(None, (member.request_status, member.exit));
            self.bump(member.chat_space_id, delta);
        }
        Ok(inserted)
    }

    async fn rejoin_member(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        visibility: ChatSpaceVisibility,
    ) -> AppResult<Result<(ChatSpaceMembership, Transition), LifecycleError>> {
        let (outcome, delta) = {
            let mut members = self.members.lock().unwrap();
            let Some(member) = members.get_mut(&(chat_space_id, member_id)) else {
                return Err(AppError::MemberNotFound {
                    chat_space_id,
                    member_id,
                });
            };
            let before = (member.request_status, member.exit);
            match member.rejoin(visibility) {
                Ok(transition) => {
                    let delta =
                        member_count_delta(Some(before), (member.request_status, member.exit));
                    (Ok((member.clone(), transition)), delta)
                }
                Err(err) => (Err(err), 0),
            }
        };
        self.bump(chat_space_id, delta);
        Ok(outcome)
    }

    async fn set_request_status(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        status: RequestToJoinStatus,
        comment: Option<String>,
    ) -> AppResult<Option<Transition>> {
        let (transition, exit) = {
            let mut members = self.members.lock().unwrap();
            let Some(member) = members.get_mut(&(chat_space_id, member_id)) else {
                return Ok(None);
            };
            let transition = Transition {
                from: member.request_status,
                to: status,
            };
            member.request_status = status;
            member.comment = comment;
            (transition, member.exit)
        };
        let delta = member_count_delta(Some((transition.from, exit)), (status, exit));
        self.bump(chat_space_id, delta);
        Ok(Some(transition))
    }

    async fn set_role(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        role: MemberRole,
    ) -> AppResult<bool> {
        let mut members = self.members.lock().unwrap();
        match members.get_mut(&(chat_space_id, member_id)) {
            Some(member) => {
                member.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_exit_state(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        exit: MembershipExitState,
    ) -> AppResult<bool> {
        let (status, previous) = {
            let mut members = self.members.lock().unwrap();
            let Some(member) = members.get_mut(&(chat_space_id, member_id)) else {
                return Ok(false);
            };
            let previous = member.exit;
            if previous != MembershipExitState::Removed {
                member.exit = exit;
            }
            (member.request_status, previous)
        };
        let exit = match previous {
            MembershipExitState::Removed => previous,
            _ => exit,
        };
        let delta = member_count_delta(Some((status, previous)), (status, exit));
        self.bump(chat_space_id, delta);
        Ok(true)
    }

    async fn step_down_admin(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        step: AdminStepDown,
    ) -> AppResult<bool> {
        let delta = {
            let mut members = self.members.lock().unwrap();
            let admins: Vec<Uuid> = members
                .values()
                .filter(|m| m.chat_space_id == chat_space_id && m.can_administer())
                .map(|m| m.member_id)
                .collect();
            if admins.contains(&member_id) && admins.len() <= 1 {
                return Ok(false);
            }
            let Some(member) = members.get_mut(&(chat_space_id, member_id)) else {
                return Err(AppError::MemberNotFound {
                    chat_space_id,
                    member_id,
                });
            };
            let before = (member.request_status, member.exit);
            match step {
                AdminStepDown::Downgrade => member.downgrade(),
                AdminStepDown::Leave => member.leave(),
            }
            member_count_delta(Some(before), (member.request_status, member.exit))
        };
        self.bump(chat_space_id, delta);
        Ok(true)
    }
}

/// Delegates to a [`MockChatSpaceStore`] but runs `before_locked_write`
/// right before the locked rejoin, exit-state and step-down writes, standing in
/// for a request that commits between the service's read and its write.
pub struct InterleavingChatSpaceStore {
    pub inner: MockChatSpaceStore,
    pub before_locked_write: Box<dyn Fn(&MockChatSpaceStore) + Send + Sync>,
}

#[async_trait]
impl ChatSpaceStore for InterleavingChatSpaceStore {
    async fn find_chat_space(&self, chat_space_id: Uuid) -> AppResult<Option<ChatSpace>> {
        self.inner.find_chat_space(chat_space_id).await
    }

    async fn create_chat_space(
        &self,
        chat_space: &ChatSpace,
        creator: &ChatSpaceMembership,
    ) -> AppResult<()> {
        self.inner.create_chat_space(chat_space, creator).await
    }

    async fn find_member(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<ChatSpaceMembership>> {
        self.inner.find_member(chat_space_id, member_id).await
    }

    async fn insert_member(&self, member: &ChatSpaceMembership) -> AppResult<bool> {
        self.inner.insert_member(member).await
    }

    async fn rejoin_member(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        visibility: ChatSpaceVisibility,
    ) -> AppResult<Result<(ChatSpaceMembership, Transition), LifecycleError>> {
        (self.before_locked_write)(&self.inner);
        self.inner
            .rejoin_member(chat_space_id, member_id, visibility)
            .await
    }

    async fn set_request_status(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        status: RequestToJoinStatus,
        comment: Option<String>,
    ) -> AppResult<Option<Transition>> {
        self.inner
            .set_request_status(chat_space_id, member_id, status, comment)
            .await
    }

    async fn set_role(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        role: MemberRole,
    ) -> AppResult<bool> {
        self.inner.set_role(chat_space_id, member_id, role).await
    }

    async fn set_exit_state(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        exit: MembershipExitState,
    ) -> AppResult<bool> {
        (self.before_locked_write)(&self.inner);
        self.inner.set_exit_state(chat_space_id, member_id, exit).await
    }

    async fn step_down_admin(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        step: AdminStepDown,
    ) -> AppResult<bool> {
        (self.before_locked_write)(&self.inner);
        self.inner
            .step_down_admin(chat_space_id, member_id, step)
            .await
    }
}

pub fn app_state(streams: &MockStreamStore, chat_spaces: &MockChatSpaceStore) -> AppState {
    AppState::new(
        Arc::new(streams.clone()),
        Arc::new(chat_spaces.clone()),
        MAX_BULK_IDS,
    )
}
