mod game;
mod participant;
mod schedule_record;
mod shared;

pub use game::IGameRepo;
use game::{InMemoryGameRepo, PostgresGameRepo};
pub use participant::IParticipantRepo;
use participant::{InMemoryParticipantRepo, PostgresParticipantRepo};
pub use schedule_record::IScheduleRecordRepo;
use schedule_record::{InMemoryScheduleRecordRepo, PostgresScheduleRecordRepo};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repos {
    pub games: Arc<dyn IGameRepo>,
    pub participants: Arc<dyn IParticipantRepo>,
    pub schedule_records: Arc<dyn IScheduleRecordRepo>,
}

impl Repos {
    pub fn create_postgres(pool: PgPool) -> Self {
        Self {
            games: Arc::new(PostgresGameRepo::new(pool.clone())),
            participants: Arc::new(PostgresParticipantRepo::new(pool.clone())),
            schedule_records: Arc::new(PostgresScheduleRecordRepo::new(pool)),
        }
    }

    pub fn create_inmemory() -> Self {
        let schedule_records: Arc<dyn IScheduleRecordRepo> =
            Arc::new(InMemoryScheduleRecordRepo::new());
        let participants = Arc::new(InMemoryParticipantRepo::new(schedule_records.clone()));
        let games = Arc::new(InMemoryGameRepo::new(
            participants.clone(),
            schedule_records.clone(),
        ));

        Self {
            games,
            participants,
            schedule_records,
        }
    }
}
