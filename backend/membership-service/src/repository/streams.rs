use async_trait::async_trait;
use join_status::{RequestToJoinStatus, StreamAttendance};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::StreamStore;
use crate::domain::models::{StreamAttendeeRow, StreamRow};
use crate::domain::Stream;
use crate::error::{AppError, AppResult};

/// PostgreSQL-backed stream and attendee storage
#[derive(Clone)]
pub struct PgStreamRepository {
    pool: PgPool,
}

impl PgStreamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Counter change for one attendee moving `from` -> `to`
fn attendee_count_delta(from: RequestToJoinStatus, to: RequestToJoinStatus) -> i64 {
    i64::from(to.is_approved()) - i64::from(from.is_approved())
}

/// Lock an attendee row for the rest of the transaction
async fn lock_attendee(
    conn: &mut PgConnection,
    stream_id: Uuid,
    member_id: Uuid,
) -> AppResult<Option<StreamAttendance>> {
    let row = sqlx::query_as::<_, StreamAttendeeRow>(
        r#"
        SELECT id, stream_id, member_id, request_to_join_status, is_attending, is_a_speaker
        FROM stream_attendees
        WHERE stream_id = $1 AND member_id = $2
        FOR UPDATE
        "#,
    )
    .bind(stream_id)
    .bind(member_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(StreamAttendance::try_from).transpose()
}

async fn apply_attendee_delta(conn: &mut PgConnection, stream_id: Uuid, delta: i64) -> AppResult<()> {
    if delta == 0 {
        return Ok(());
    }
    sqlx::query(
        r#"
        UPDATE streams
        SET total_attendees = GREATEST(total_attendees + $2, 0), updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(stream_id)
    .bind(delta)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_attendee_row(conn: &mut PgConnection, attendee: &StreamAttendance) -> AppResult<bool> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO stream_attendees
            (id, stream_id, member_id, request_to_join_status, is_attending, is_a_speaker)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (stream_id, member_id) DO NOTHING
        "#,
    )
    .bind(attendee.id)
    .bind(attendee.stream_id)
    .bind(attendee.member_id)
    .bind(attendee.request_status.to_db())
    .bind(attendee.is_attending)
    .bind(attendee.is_a_speaker)
    .execute(&mut *conn)
    .await?
    .rows_affected()
        > 0;

    Ok(inserted)
}

#[async_trait]
impl StreamStore for PgStreamRepository {
    async fn find_stream(&self, stream_id: Uuid) -> AppResult<Option<Stream>> {
        let row = sqlx::query_as::<_, StreamRow>(
            r#"
            SELECT id, organizer_id, title, visibility, scheduled_start_date,
                   scheduled_end_date, total_attendees
            FROM streams
            WHERE id = $1
            "#,
        )
        .bind(stream_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Stream::try_from).transpose()
    }

    async fn find_attendee(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Option<StreamAttendance>> {
        let row = sqlx::query_as::<_, StreamAttendeeRow>(
            r#"
            SELECT id, stream_id, member_id, request_to_join_status, is_attending, is_a_speaker
            FROM stream_attendees
            WHERE stream_id = $1 AND member_id = $2
            "#,
        )
        .bind(stream_id)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StreamAttendance::try_from).transpose()
    }

    async fn insert_attendee(&self, attendee: &StreamAttendance) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let inserted = insert_attendee_row(&mut tx, attendee).await?;
        if inserted && attendee.request_status.is_approved() {
            apply_attendee_delta(&mut tx, attendee.stream_id, 1).await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn admit_attendee(&self, attendee: &StreamAttendance) -> AppResult<StreamAttendance> {
        let (stream_id, member_id) = (attendee.stream_id, attendee.member_id);
        let mut tx = self.pool.begin().await?;

        let mut existing = lock_attendee(&mut tx, stream_id, member_id).await?;
        if existing.is_none() {
            if insert_attendee_row(&mut tx, attendee).await? {
                let delta = i64::from(attendee.request_status.is_approved());
                apply_attendee_delta(&mut tx, stream_id, delta).await?;
                tx.commit().await?;
                return Ok(attendee.clone());
            }
            // A concurrent request created the row after our lookup
            existing = lock_attendee(&mut tx, stream_id, member_id).await?;
        }

        let Some(mut current) = existing else {
            tx.rollback().await?;
            return Err(AppError::AttendeeNotFound {
                stream_id,
                member_id,
            });
        };

        let transition = current.approve();
        current.set_attending(true);
        sqlx::query(
            r#"
            UPDATE stream_attendees
            SET request_to_join_status = $2, is_attending = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(current.id)
        .bind(current.request_status.to_db())
        .execute(&mut *tx)
        .await?;

        apply_attendee_delta(&mut tx, stream_id, attendee_count_delta(transition.from, transition.to))
            .await?;

        tx.commit().await?;
        Ok(current)
    }

    async fn set_request_status(
        &self,
        stream_id: Uuid,
        attendee_ids: &[Uuid],
        status: RequestToJoinStatus,
    ) -> AppResult<u64> {
        if attendee_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        // Lock the affected rows so the counter delta matches what we overwrite
        let locked = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT id, request_to_join_status
            FROM stream_attendees
            WHERE stream_id = $1 AND id = ANY($2) AND request_to_join_status <> $3
            FOR UPDATE
            "#,
        )
        .bind(stream_id)
        .bind(attendee_ids)
        .bind(status.to_db())
        .fetch_all(&mut *tx)
        .await?;

        if locked.is_empty() {
            tx.rollback().await?;
            return Ok(0);
        }

        let changed_ids: Vec<Uuid> = locked.iter().map(|(id, _)| *id).collect();
        let delta: i64 = locked
            .iter()
            .filter_map(|(_, previous)| RequestToJoinStatus::from_db(previous))
            .map(|previous| attendee_count_delta(previous, status))
            .sum();

        let updated = sqlx::query(
            r#"
            UPDATE stream_attendees
            SET request_to_join_status = $2, updated_at = NOW()
            WHERE id = ANY($1)
            "#,
        )
        .bind(&changed_ids)
        .bind(status.to_db())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        apply_attendee_delta(&mut tx, stream_id, delta).await?;

        tx.commit().await?;

        tracing::debug!(
            stream_id = %stream_id,
            status = %status,
            updated,
            delta,
            "attendee request status updated"
        );
        Ok(updated)
    }

    async fn set_attending(
        &self,
        stream_id: Uuid,
        member_id: Uuid,
        attending: bool,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE stream_attendees
            SET is_attending = $3, updated_at = NOW()
            WHERE stream_id = $1 AND member_id = $2
            "#,
        )
        .bind(stream_id)
        .bind(member_id)
        .bind(attending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_speakers(
        &self,
        stream_id: Uuid,
        attendee_ids: &[Uuid],
        is_speaker: bool,
    ) -> AppResult<u64> {
        if attendee_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE stream_attendees
            SET is_a_speaker = $3, updated_at = NOW()
            WHERE stream_id = $1 AND id = ANY($2) AND is_a_speaker <> $3
            "#,
        )
        .bind(stream_id)
        .bind(attendee_ids)
        .bind(is_speaker)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
