use async_trait::async_trait;
use join_status::{
    ChatSpaceMembership, ChatSpaceVisibility, LifecycleError, MemberRole, MembershipExitState,
    RequestToJoinStatus, Transition,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{AdminStepDown, ChatSpaceStore};
use crate::domain::models::{member_count_delta, ChatSpaceMemberRow, ChatSpaceRow};
use crate::domain::ChatSpace;
use crate::error::{AppError, AppResult};

/// PostgreSQL-backed chat space and member storage
#[derive(Clone)]
pub struct PgChatSpaceRepository {
    pool: PgPool,
}

impl PgChatSpaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lock a member row for the rest of the transaction
async fn lock_member(
    conn: &mut PgConnection,
    chat_space_id: Uuid,
    member_id: Uuid,
) -> AppResult<Option<ChatSpaceMembership>> {
    let row = sqlx::query_as::<_, ChatSpaceMemberRow>(
        r#"
        SELECT chat_space_id, member_id, request_to_join_status, role, is_left, is_removed, comment
        FROM chat_space_members
        WHERE chat_space_id = $1 AND member_id = $2
        FOR UPDATE
        "#,
    )
    .bind(chat_space_id)
    .bind(member_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(ChatSpaceMembership::try_from).transpose()
}

async fn apply_member_delta(conn: &mut PgConnection, chat_space_id: Uuid, delta: i64) -> AppResult<()> {
    if delta == 0 {
        return Ok(());
    }
    sqlx::query(
        r#"
        UPDATE chat_spaces
        SET total_members = GREATEST(total_members + $2, 0), updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(chat_space_id)
    .bind(delta)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl ChatSpaceStore for PgChatSpaceRepository {
    async fn find_chat_space(&self, chat_space_id: Uuid) -> AppResult<Option<ChatSpace>> {
        let row = sqlx::query_as::<_, ChatSpaceRow>(
            r#"
            SELECT id, creator_id, name, visibility, is_active, is_deleted, total_members
            FROM chat_spaces
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(chat_space_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ChatSpace::try_from).transpose()
    }

    async fn create_chat_space(
        &self,
        chat_space: &ChatSpace,
        creator: &ChatSpaceMembership,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO chat_spaces (id, creator_id, name, visibility, is_active, is_deleted, total_members)
            VALUES ($1, $2, $3, $4, $5, FALSE, 1)
            "#,
        )
        .bind(chat_space.id)
        .bind(chat_space.creator_id)
        .bind(&chat_space.name)
        .bind(chat_space.visibility.to_db())
        .bind(chat_space.is_active)
        .execute(&mut *tx)
        .await?;

        let (is_left, is_removed) = creator.exit.to_flags();
        sqlx::query(
            r#"
            INSERT INTO chat_space_members
                (chat_space_id, member_id, request_to_join_status, role, is_left, is_removed, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(creator.chat_space_id)
        .bind(creator.member_id)
        .bind(creator.request_status.to_db())
        .bind(creator.role.to_db())
        .bind(is_left)
        .bind(is_removed)
        .bind(&creator.comment)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_member(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<ChatSpaceMembership>> {
        let row = sqlx::query_as::<_, ChatSpaceMemberRow>(
            r#"
            SELECT chat_space_id, member_id, request_to_join_status, role, is_left, is_removed, comment
            FROM chat_space_members
            WHERE chat_space_id = $1 AND member_id = $2
            "#,
        )
        .bind(chat_space_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ChatSpaceMembership::try_from).transpose()
    }

    async fn insert_member(&self, member: &ChatSpaceMembership) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;
        let (is_left, is_removed) = member.exit.to_flags();

        let inserted = sqlx::query(
            r#"
            INSERT INTO chat_space_members
                (chat_space_id, member_id, request_to_join_status, role, is_left, is_removed, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (chat_space_id, member_id) DO NOTHING
            "#,
        )
        .bind(member.chat_space_id)
        .bind(member.member_id)
        .bind(member.request_status.to_db())
        .bind(member.role.to_db())
        .bind(is_left)
        .bind(is_removed)
        .bind(&member.comment)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            > 0;

        if inserted {
            let delta = member_count_delta(None, (member.request_status, member.exit));
            apply_member_delta(&mut tx, member.chat_space_id, delta).await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn rejoin_member(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        visibility: ChatSpaceVisibility,
    ) -> AppResult<Result<(ChatSpaceMembership, Transition), LifecycleError>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut member) = lock_member(&mut tx, chat_space_id, member_id).await? else {
            tx.rollback().await?;
            return Err(AppError::MemberNotFound {
                chat_space_id,
                member_id,
            });
        };

        let before = (member.request_status, member.exit);
        let transition = match member.rejoin(visibility) {
            Ok(transition) => transition,
            Err(err) => {
                tx.rollback().await?;
                return Ok(Err(err));
            }
        };

        let (is_left, is_removed) = member.exit.to_flags();
        sqlx::query(
            r#"
            UPDATE chat_space_members
            SET request_to_join_status = $3, role = $4, is_left = $5, is_removed = $6,
                comment = $7, updated_at = NOW()
            WHERE chat_space_id = $1 AND member_id = $2
            "#,
        )
        .bind(chat_space_id)
        .bind(member_id)
        .bind(member.request_status.to_db())
        .bind(member.role.to_db())
        .bind(is_left)
        .bind(is_removed)
        .bind(&member.comment)
        .execute(&mut *tx)
        .await?;

        let delta = member_count_delta(Some(before), (member.request_status, member.exit));
        apply_member_delta(&mut tx, chat_space_id, delta).await?;

        tx.commit().await?;
        Ok(Ok((member, transition)))
    }

    async fn set_request_status(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        status: RequestToJoinStatus,
        comment: Option<String>,
    ) -> AppResult<Option<Transition>> {
        let mut tx = self.pool.begin().await?;

        let Some(member) = lock_member(&mut tx, chat_space_id, member_id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };
        let (previous, exit) = (member.request_status, member.exit);

        sqlx::query(
            r#"
            UPDATE chat_space_members
            SET request_to_join_status = $3, comment = $4, updated_at = NOW()
            WHERE chat_space_id = $1 AND member_id = $2
            "#,
        )
        .bind(chat_space_id)
        .bind(member_id)
        .bind(status.to_db())
        .bind(&comment)
        .execute(&mut *tx)
        .await?;

        let delta = member_count_delta(Some((previous, exit)), (status, exit));
        apply_member_delta(&mut tx, chat_space_id, delta).await?;

        tx.commit().await?;
        Ok(Some(Transition {
            from: previous,
            to: status,
        }))
    }

    async fn set_role(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        role: MemberRole,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE chat_space_members
            SET role = $3, updated_at = NOW()
            WHERE chat_space_id = $1 AND member_id = $2
            "#,
        )
        .bind(chat_space_id)
        .bind(member_id)
        .bind(role.to_db())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_exit_state(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        exit: MembershipExitState,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let Some(member) = lock_member(&mut tx, chat_space_id, member_id).await? else {
            tx.rollback().await?;
            return Ok(false);
        };
        let (status, previous_exit) = (member.request_status, member.exit);
        // Removed is terminal; a racing leave must not undo it
        let exit = match previous_exit {
            MembershipExitState::Removed => MembershipExitState::Removed,
            _ => exit,
        };

        let (is_left, is_removed) = exit.to_flags();
        sqlx::query(
            r#"
            UPDATE chat_space_members
            SET is_left = $3, is_removed = $4, updated_at = NOW()
            WHERE chat_space_id = $1 AND member_id = $2
            "#,
        )
        .bind(chat_space_id)
        .bind(member_id)
        .bind(is_left)
        .bind(is_removed)
        .execute(&mut *tx)
        .await?;

        let delta = member_count_delta(Some((status, previous_exit)), (status, exit));
        apply_member_delta(&mut tx, chat_space_id, delta).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn step_down_admin(
        &self,
        chat_space_id: Uuid,
        member_id: Uuid,
        step: AdminStepDown,
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Concurrent step-downs serialize on these locks; a row demoted by
        // the winner no longer matches when the loser re-reads it.
        let admins: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT member_id
            FROM chat_space_members
            WHERE chat_space_id = $1
              AND role = 'ADMIN'
              AND request_to_join_status = 'APPROVED'
              AND is_left = FALSE
              AND is_removed = FALSE
            FOR UPDATE
            "#,
        )
        .bind(chat_space_id)
        .fetch_all(&mut *tx)
        .await?;

        if admins.contains(&member_id) && admins.len() <= 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        let Some(mut member) = lock_member(&mut tx, chat_space_id, member_id).await? else {
            tx.rollback().await?;
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

        let (is_left, is_removed) = member.exit.to_flags();
        sqlx::query(
            r#"
            UPDATE chat_space_members
            SET role = $3, is_left = $4, is_removed = $5, updated_at = NOW()
            WHERE chat_space_id = $1 AND member_id = $2
            "#,
        )
        .bind(chat_space_id)
        .bind(member_id)
        .bind(member.role.to_db())
        .bind(is_left)
        .bind(is_removed)
        .execute(&mut *tx)
        .await?;

        let delta = member_count_delta(Some(before), (member.request_status, member.exit));
        apply_member_delta(&mut tx, chat_space_id, delta).await?;

        tx.commit().await?;
        Ok(true)
    }
}
