use super::IScheduleRecordRepo;
use game_notifier_domain::{NotificationKind, ScheduleRecord, ID, DUE_BUCKET_MILLIS};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresScheduleRecordRepo {
    pool: PgPool,
}

impl PostgresScheduleRecordRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ScheduleRecordRaw {
    schedule_record_uid: Uuid,
    game_uid: Uuid,
    kind: String,
    due_at: i64,
    entity_deadline_at: i64,
    lead_millis: i64,
    participant_uid: Option<Uuid>,
    sent: bool,
}

impl TryFrom<ScheduleRecordRaw> for ScheduleRecord {
    type Error = anyhow::Error;

    fn try_from(raw: ScheduleRecordRaw) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.schedule_record_uid.into(),
            game_id: raw.game_uid.into(),
            kind: raw.kind.parse::<NotificationKind>()?,
            due_at: raw.due_at,
            entity_deadline_at: raw.entity_deadline_at,
            lead_millis: raw.lead_millis,
            participant_id: raw.participant_uid.map(ID::from),
            sent: raw.sent,
        })
    }
}

/// Rows that can not be understood are skipped, they would otherwise block
/// every other record from being dispatched
fn into_records(rows: Vec<ScheduleRecordRaw>) -> Vec<ScheduleRecord> {
    rows.into_iter()
        .filter_map(|raw| {
            let id = raw.schedule_record_uid;
            match ScheduleRecord::try_from(raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    error!("Skipping malformed schedule record: {}. Err: {:?}", id, e);
                    None
                }
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl IScheduleRecordRepo for PostgresScheduleRecordRepo {
    async fn insert(&self, record: &ScheduleRecord) -> anyhow::Result<bool> {
        // The partial unique index over unsent records turns a duplicate
        // into a no-op
        let inserted = sqlx::query(
            r#"
            INSERT INTO schedule_records
            (schedule_record_uid, game_uid, kind, due_at, due_bucket, entity_deadline_at, lead_millis, participant_uid, sent)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(record.id.inner_ref())
        .bind(record.game_id.inner_ref())
        .bind(record.kind.as_str())
        .bind(record.due_at)
        .bind(record.due_bucket())
        .bind(record.entity_deadline_at)
        .bind(record.lead_millis)
        .bind(record.participant_id.map(|id| id.inner()))
        .bind(record.sent)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted == 1)
    }

    async fn find(&self, record_id: &ID) -> anyhow::Result<Option<ScheduleRecord>> {
        let raw: Option<ScheduleRecordRaw> = sqlx::query_as(
            r#"
            SELECT * FROM schedule_records AS s
            WHERE s.schedule_record_uid = $1
            "#,
        )
        .bind(record_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        raw.map(ScheduleRecord::try_from).transpose()
    }

    async fn find_by_game(&self, game_id: &ID) -> anyhow::Result<Vec<ScheduleRecord>> {
        let rows: Vec<ScheduleRecordRaw> = sqlx::query_as(
            r#"
            SELECT * FROM schedule_records AS s
            WHERE s.game_uid = $1
            ORDER BY s.due_at
            "#,
        )
        .bind(game_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        Ok(into_records(rows))
    }

    async fn select_due_unsent(&self, now: i64) -> anyhow::Result<Vec<ScheduleRecord>> {
        let rows: Vec<ScheduleRecordRaw> = sqlx::query_as(
            r#"
            SELECT * FROM schedule_records AS s
            WHERE s.sent = false AND s.due_at <= $1
            ORDER BY s.due_at
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(into_records(rows))
    }

    async fn try_claim(&self, record_id: &ID) -> anyhow::Result<bool> {
        let claimed = sqlx::query(
            r#"
            UPDATE schedule_records
            SET sent = true
            WHERE schedule_record_uid = $1 AND sent = false
            "#,
        )
        .bind(record_id.inner_ref())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(claimed == 1)
    }

    async fn reschedule_game(&self, game_id: &ID, deadline_ts: i64) -> anyhow::Result<u64> {
        let updated = sqlx::query(
            r#"
            UPDATE schedule_records
            SET entity_deadline_at = $2,
                due_at = CASE WHEN kind = 'reminder' THEN $2 - lead_millis ELSE due_at END,
                -- Floored like `due_bucket`, bigint division would truncate negative due times
                due_bucket = CASE
                    WHEN kind = 'reminder' THEN floor(($2 - lead_millis)::numeric / $3)::bigint
                    ELSE due_bucket
                END
            WHERE game_uid = $1 AND sent = false
            "#,
        )
        .bind(game_id.inner_ref())
        .bind(deadline_ts)
        .bind(DUE_BUCKET_MILLIS)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated)
    }

    async fn delete_unsent_reminders_except(
        &self,
        game_id: &ID,
        keep_lead_millis: &[i64],
    ) -> anyhow::Result<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM schedule_records
            WHERE game_uid = $1
                AND sent = false
                AND kind = 'reminder'
                AND NOT (lead_millis = ANY($2))
            "#,
        )
        .bind(game_id.inner_ref())
        .bind(keep_lead_millis)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }

    async fn delete_by_game(&self, game_id: &ID) -> anyhow::Result<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM schedule_records
            WHERE game_uid = $1
            "#,
        )
        .bind(game_id.inner_ref())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }

    async fn delete_by_participant(&self, participant_id: &ID) -> anyhow::Result<u64> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM schedule_records
            WHERE participant_uid = $1
            "#,
        )
        .bind(participant_id.inner_ref())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }
}
