use super::IGameRepo;
use crate::repos::participant::find_participants_by_game;
use game_notifier_domain::{Game, GameReminder, GameWithParticipants, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresGameRepo {
    pool: PgPool,
}

impl PostgresGameRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GameRaw {
    game_uid: Uuid,
    title: String,
    start_ts: i64,
    max_participants: Option<i64>,
    instructions: Option<String>,
    reminder_minutes: Vec<i64>,
}

impl From<GameRaw> for Game {
    fn from(raw: GameRaw) -> Self {
        Self {
            id: raw.game_uid.into(),
            title: raw.title,
            start_ts: raw.start_ts,
            max_participants: raw.max_participants,
            instructions: raw.instructions,
            reminders: raw
                .reminder_minutes
                .into_iter()
                .map(|minutes_before| GameReminder { minutes_before })
                .collect(),
        }
    }
}

fn reminder_minutes(game: &Game) -> Vec<i64> {
    game.reminders.iter().map(|r| r.minutes_before).collect()
}

#[async_trait::async_trait]
impl IGameRepo for PostgresGameRepo {
    async fn insert(&self, game: &Game) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO games
            (game_uid, title, start_ts, max_participants, instructions, reminder_minutes)
            VALUES($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(game.id.inner_ref())
        .bind(&game.title)
        .bind(game.start_ts)
        .bind(game.max_participants)
        .bind(&game.instructions)
        .bind(reminder_minutes(game))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, game: &Game) -> anyhow::Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE games
            SET title = $2,
            start_ts = $3,
            max_participants = $4,
            instructions = $5,
            reminder_minutes = $6
            WHERE game_uid = $1
            "#,
        )
        .bind(game.id.inner_ref())
        .bind(&game.title)
        .bind(game.start_ts)
        .bind(game.max_participants)
        .bind(&game.instructions)
        .bind(reminder_minutes(game))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            anyhow::bail!("Game: {} not found", game.id);
        }
        Ok(())
    }

    async fn find(&self, game_id: &ID) -> anyhow::Result<Option<Game>> {
        let raw: Option<GameRaw> = sqlx::query_as(
            r#"
            SELECT * FROM games AS g
            WHERE g.game_uid = $1
            "#,
        )
        .bind(game_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(raw.map(Game::from))
    }

    async fn find_with_participants(
        &self,
        game_id: &ID,
    ) -> anyhow::Result<Option<GameWithParticipants>> {
        let game = match self.find(game_id).await? {
            Some(game) => game,
            None => return Ok(None),
        };
        let participants = find_participants_by_game(&self.pool, game_id).await?;

        Ok(Some(GameWithParticipants { game, participants }))
    }

    async fn delete(&self, game_id: &ID) -> anyhow::Result<Option<Game>> {
        // participants and schedule_records cascade
        let raw: Option<GameRaw> = sqlx::query_as(
            r#"
            DELETE FROM games AS g
            WHERE g.game_uid = $1
            RETURNING *
            "#,
        )
        .bind(game_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(raw.map(Game::from))
    }
}
