use super::IParticipantRepo;
use game_notifier_domain::{Participant, ID};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::error;

pub struct PostgresParticipantRepo {
    pool: PgPool,
}

impl PostgresParticipantRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ParticipantRaw {
    participant_uid: Uuid,
    game_uid: Uuid,
    user_ref: Option<String>,
    display_label: Option<String>,
    category: i16,
    rank: i64,
    joined_at: i64,
}

impl TryFrom<ParticipantRaw> for Participant {
    type Error = game_notifier_domain::InvalidParticipantError;

    fn try_from(raw: ParticipantRaw) -> Result<Self, Self::Error> {
        Participant::from_parts(
            raw.participant_uid.into(),
            raw.game_uid.into(),
            raw.user_ref,
            raw.display_label,
            raw.category,
            raw.rank,
            raw.joined_at,
        )
    }
}

/// A row that violates the roster invariants is left out of the roster
/// and logged
fn into_participants(rows: Vec<ParticipantRaw>) -> Vec<Participant> {
    rows.into_iter()
        .filter_map(|raw| match Participant::try_from(raw) {
            Ok(participant) => Some(participant),
            Err(e) => {
                error!("Skipping invalid participant. Err: {:?}", e);
                None
            }
        })
        .collect()
}

pub(crate) async fn find_participants_by_game(
    pool: &PgPool,
    game_id: &ID,
) -> anyhow::Result<Vec<Participant>> {
    let rows: Vec<ParticipantRaw> = sqlx::query_as(
        r#"
        SELECT * FROM participants AS p
        WHERE p.game_uid = $1
        "#,
    )
    .bind(game_id.inner_ref())
    .fetch_all(pool)
    .await?;

    Ok(into_participants(rows))
}

#[async_trait::async_trait]
impl IParticipantRepo for PostgresParticipantRepo {
    async fn insert(&self, participant: &Participant) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO participants
            (participant_uid, game_uid, user_ref, display_label, category, rank, joined_at)
            VALUES($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(participant.id.inner_ref())
        .bind(participant.game_id.inner_ref())
        .bind(participant.user_ref())
        .bind(participant.display_label())
        .bind(participant.category.sort_key())
        .bind(participant.rank)
        .bind(participant.joined_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, participant_id: &ID) -> anyhow::Result<Option<Participant>> {
        let raw: Option<ParticipantRaw> = sqlx::query_as(
            r#"
            SELECT * FROM participants AS p
            WHERE p.participant_uid = $1
            "#,
        )
        .bind(participant_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(raw.map(Participant::try_from).transpose()?)
    }

    async fn find_by_game(&self, game_id: &ID) -> anyhow::Result<Vec<Participant>> {
        find_participants_by_game(&self.pool, game_id).await
    }

    async fn delete(&self, participant_id: &ID) -> anyhow::Result<Option<Participant>> {
        // schedule_records.participant_uid cascades
        let raw: Option<ParticipantRaw> = sqlx::query_as(
            r#"
            DELETE FROM participants AS p
            WHERE p.participant_uid = $1
            RETURNING *
            "#,
        )
        .bind(participant_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(raw.map(Participant::try_from).transpose()?)
    }
}
