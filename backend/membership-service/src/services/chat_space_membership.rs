//! Chat space membership flow

use join_status::{
    assemble_membership_info, explain_chat_space, resolve_chat_space, ChatSpaceMembership,
    ChatSpaceMembershipInfo, ChatSpaceVisibility, JoinStatus, LifecycleError, MemberRole,
    MembershipExitState, RequestToJoinStatus,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ChatSpace;
use crate::error::{AppError, AppResult};
use crate::metrics::{record_resolution, ResolutionKind};
use crate::repository::{AdminStepDown, ChatSpaceStore};

#[derive(Clone)]
pub struct ChatSpaceMembershipService {
    store: Arc<dyn ChatSpaceStore>,
}

impl ChatSpaceMembershipService {
    pub fn new(store: Arc<dyn ChatSpaceStore>) -> Self {
        Self { store }
    }

    pub fn resolve(
        chat_space: &ChatSpace,
        member: Option<&ChatSpaceMembership>,
    ) -> ChatSpaceMembershipInfo {
        let Some(member) = member else {
            let status = JoinStatus::by_chat_space_visibility(chat_space.visibility);
            record_resolution(ResolutionKind::ChatSpace, status);
            return ChatSpaceMembershipInfo::not_joined(status);
        };

        let facts = member.join_facts(chat_space.visibility);
        let status = resolve_chat_space(facts);
        debug!(
            chat_space_id = %chat_space.id,
            member_id = %member.member_id,
            rule = explain_chat_space(&facts),
            status = %status,
            "resolved chat space join status"
        );
        record_resolution(ResolutionKind::ChatSpace, status);

        assemble_membership_info(
            Some(member.request_status),
            Some(status),
            Some(member.role),
            member.exit,
        )
    }

    /// Create a space; the creator becomes its first approved admin
    pub async fn create_chat_space(
        &self,
        creator_id: Uuid,
        name: String,
        visibility: ChatSpaceVisibility,
    ) -> AppResult<ChatSpace> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Chat space name cannot be empty".into()));
        }
        if name.len() > 255 {
            return Err(AppError::BadRequest(
                "Chat space name too long (max 255)".into(),
            ));
        }

        let chat_space = ChatSpace {
            id: Uuid::new_v4(),
            creator_id,
            name,
            visibility,
            is_active: true,
            is_deleted: false,
            total_members: 1,
        };
        let creator = ChatSpaceMembership::creator(chat_space.id, creator_id);
        self.store.create_chat_space(&chat_space, &creator).await?;

        info!(
            chat_space_id = %chat_space.id,
            creator_id = %creator_id,
            visibility = %visibility,
            "chat space created"
        );
        Ok(chat_space)
    }

    pub async fn membership_info(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        let chat_space = self.load_chat_space(chat_space_id).await?;
        let member = self.store.find_member(chat_space_id, member_id).await?;
        Ok(Self::resolve(&chat_space, member.as_ref()))
    }

    /// Public spaces are readable by anyone who was not removed; private
    /// spaces need a granting join status.
    pub async fn can_view_content(&self, chat_space_id: Uuid, member_id: Uuid) -> AppResult<bool> {
        let chat_space = self.load_chat_space(chat_space_id).await?;
        let member = self.store.find_member(chat_space_id, member_id).await?;
        let info = Self::resolve(&chat_space, member.as_ref());

        Ok(match chat_space.visibility {
            ChatSpaceVisibility::Public => info.exit != Some(MembershipExitState::Removed),
            ChatSpaceVisibility::Private => info.grants_access(),
        })
    }

    /// Ask to join, or come back after leaving. Idempotent for active rows.
    pub async fn request_to_join(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        let chat_space = self.load_chat_space(chat_space_id).await?;
        if !chat_space.is_active {
            return Err(AppError::BadRequest("Chat space is not active".into()));
        }

        match self.store.find_member(chat_space_id, member_id).await? {
            Some(existing) if existing.exit == MembershipExitState::Active => {
                Ok(Self::resolve(&chat_space, Some(&existing)))
            }
            Some(existing) => {
                // Decided against the locked row; a removal that lands
                // after our read still wins.
                match self
                    .store
                    .rejoin_member(chat_space_id, member_id, chat_space.visibility)
                    .await?
                {
                    Ok((member, transition)) => {
                        info!(
                            chat_space_id = %chat_space_id,
                            member_id = %member_id,
                            status = %transition.to,
                            "member rejoined chat space"
                        );
                        Ok(Self::resolve(&chat_space, Some(&member)))
                    }
                    Err(LifecycleError::StillActive) => {
                        let current = self.require_member(chat_space_id, member_id).await?;
                        Ok(Self::resolve(&chat_space, Some(&current)))
                    }
                    Err(LifecycleError::Removed) => {
                        warn!(
                            chat_space_id = %chat_space_id,
                            member_id = %member_id,
                            previous_exit = ?existing.exit,
                            "removed member tried to rejoin"
                        );
                        Err(AppError::MemberRemoved)
                    }
                }
            }
            None => {
                let member =
                    ChatSpaceMembership::request(chat_space_id, member_id, chat_space.visibility);
                if !self.store.insert_member(&member).await? {
                    // Concurrent request for the same pair won
                    let existing = self.require_member(chat_space_id, member_id).await?;
                    return Ok(Self::resolve(&chat_space, Some(&existing)));
                }
                info!(
                    chat_space_id = %chat_space_id,
                    member_id = %member_id,
                    status = %member.request_status,
                    "member requested to join chat space"
                );
                Ok(Self::resolve(&chat_space, Some(&member)))
            }
        }
    }

    pub async fn approve_member(
        &self,
        chat_space_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
        comment: Option<String>,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        self.change_request_status(
            chat_space_id,
            actor_id,
            member_id,
            RequestToJoinStatus::Approved,
            comment,
        )
        .await
    }

    pub async fn set_member_pending(
        &self,
        chat_space_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
        comment: Option<String>,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        self.change_request_status(
            chat_space_id,
            actor_id,
            member_id,
            RequestToJoinStatus::Pending,
            comment,
        )
        .await
    }

    pub async fn disapprove_member(
        &self,
        chat_space_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        self.change_request_status(
            chat_space_id,
            actor_id,
            member_id,
            RequestToJoinStatus::Disapproved,
            None,
        )
        .await
    }

    pub async fn upgrade_member(
        &self,
        chat_space_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        let chat_space = self.load_chat_space(chat_space_id).await?;
        self.require_admin(chat_space_id, actor_id).await?;
        let mut member = self.require_member(chat_space_id, member_id).await?;

        member.upgrade();
        self.store
            .set_role(chat_space_id, member_id, member.role)
            .await?;
        info!(chat_space_id = %chat_space_id, member_id = %member_id, "member upgraded to admin");
        Ok(Self::resolve(&chat_space, Some(&member)))
    }

    pub async fn downgrade_member(
        &self,
        chat_space_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        let chat_space = self.load_chat_space(chat_space_id).await?;
        self.require_admin(chat_space_id, actor_id).await?;
        let mut member = self.require_member(chat_space_id, member_id).await?;

        if member.can_administer() {
            self.step_down(chat_space_id, member_id, AdminStepDown::Downgrade)
                .await?;
        } else {
            self.store
                .set_role(chat_space_id, member_id, MemberRole::Member)
                .await?;
        }

        member.downgrade();
        info!(chat_space_id = %chat_space_id, member_id = %member_id, "admin downgraded to member");
        Ok(Self::resolve(&chat_space, Some(&member)))
    }

    /// Leave voluntarily. The last admin has to hand over first.
    pub async fn leave(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        let chat_space = self.load_chat_space(chat_space_id).await?;
        let mut member = self.require_member(chat_space_id, member_id).await?;

        match member.exit {
            MembershipExitState::Removed => return Err(AppError::MemberRemoved),
            MembershipExitState::Left => return Ok(Self::resolve(&chat_space, Some(&member))),
            MembershipExitState::Active => {}
        }
        if member.can_administer() {
            self.step_down(chat_space_id, member_id, AdminStepDown::Leave)
                .await?;
        } else {
            self.store
                .set_exit_state(chat_space_id, member_id, MembershipExitState::Left)
                .await?;
        }

        member.leave();
        info!(chat_space_id = %chat_space_id, member_id = %member_id, "member left chat space");
        Ok(Self::resolve(&chat_space, Some(&member)))
    }

    pub async fn remove_member(
        &self,
        chat_space_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        if actor_id == member_id {
            return Err(AppError::BadRequest(
                "Use leave to exit a chat space yourself".into(),
            ));
        }

        let chat_space = self.load_chat_space(chat_space_id).await?;
        self.require_admin(chat_space_id, actor_id).await?;
        let mut member = self.require_member(chat_space_id, member_id).await?;

        member.remove();
        self.store
            .set_exit_state(chat_space_id, member_id, member.exit)
            .await?;
        info!(
            chat_space_id = %chat_space_id,
            member_id = %member_id,
            actor_id = %actor_id,
            "member removed from chat space"
        );
        Ok(Self::resolve(&chat_space, Some(&member)))
    }

    async fn change_request_status(
        &self,
        chat_space_id: Uuid,
        actor_id: Uuid,
        member_id: Uuid,
        status: RequestToJoinStatus,
        comment: Option<String>,
    ) -> AppResult<ChatSpaceMembershipInfo> {
        let chat_space = self.load_chat_space(chat_space_id).await?;
        self.require_admin(chat_space_id, actor_id).await?;

        let transition = self
            .store
            .set_request_status(chat_space_id, member_id, status, comment)
            .await?
            .ok_or(AppError::MemberNotFound {
                chat_space_id,
                member_id,
            })?;
        info!(
            chat_space_id = %chat_space_id,
            member_id = %member_id,
            from = %transition.from,
            to = %transition.to,
            "member request status changed"
        );

        let member = self.require_member(chat_space_id, member_id).await?;
        Ok(Self::resolve(&chat_space, Some(&member)))
    }

    async fn require_admin(&self, chat_space_id: Uuid, actor_id: Uuid) -> AppResult<()> {
        match self.store.find_member(chat_space_id, actor_id).await? {
            Some(actor) if actor.can_administer() => Ok(()),
            _ => Err(AppError::NotAdmin),
        }
    }

    async fn step_down(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        step: AdminStepDown,
    ) -> AppResult<()> {
        if !self
            .store
            .step_down_admin(chat_space_id, member_id, step)
            .await?
        {
            return Err(AppError::LastAdmin);
        }
        Ok(())
    }

    async fn load_chat_space(&self, chat_space_id: Uuid) -> AppResult<ChatSpace> {
        self.store
            .find_chat_space(chat_space_id)
            .await?
            .ok_or(AppError::ChatSpaceNotFound(chat_space_id))
    }

    async fn require_member(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<ChatSpaceMembership> {
        self.store
            .find_member(chat_space_id, member_id)
            .await?
            .ok_or(AppError::MemberNotFound {
                chat_space_id,
                member_id,
            })
    }
}
