use crate::shared::usecase::UseCase;
use game_notifier_domain::{Game, ScheduleRecord};
use game_notifier_infra::NotifyContext;
use tracing::warn;

/// Brings the unsent `Reminder` records of a `Game` in line with its
/// current start time and configured reminders.
///
/// Unsent records follow a moved start time, records for reminders that
/// were removed from the `Game` are deleted and the missing ones are
/// created. Reminders that would already be due are not created.
#[derive(Debug)]
pub struct SyncGameRemindersUseCase {
    pub game: Game,
}

#[derive(Debug, Default, PartialEq)]
pub struct SyncedReminders {
    pub rescheduled: u64,
    pub removed: u64,
    pub created: usize,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for SyncGameRemindersUseCase {
    type Response = SyncedReminders;

    type Error = UseCaseError;

    const NAME: &'static str = "SyncGameReminders";

    async fn execute(&mut self, ctx: &NotifyContext) -> Result<Self::Response, Self::Error> {
        let records = &ctx.repos.schedule_records;
        let now = ctx.sys.get_timestamp_millis();

        let rescheduled = records
            .reschedule_game(&self.game.id, self.game.deadline_ts())
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let keep_lead_millis = self
            .game
            .reminders
            .iter()
            .map(|r| r.lead_millis())
            .collect::<Vec<_>>();
        let removed = records
            .delete_unsent_reminders_except(&self.game.id, &keep_lead_millis)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let mut created = 0;
        for reminder in &self.game.reminders {
            let record = ScheduleRecord::reminder(&self.game, reminder);
            if record.due_at <= now {
                continue;
            }
            // Already scheduled reminders are reported as duplicates
            if records
                .insert(&record)
                .await
                .map_err(|_| UseCaseError::StorageError)?
            {
                created += 1;
            }
        }

        if rescheduled > 0 || created > 0 {
            if let Err(e) = ctx.wake.signal().await {
                warn!("Unable to wake the scheduler. Err: {:?}", e);
            }
        }

        Ok(SyncedReminders {
            rescheduled,
            removed,
            created,
        })
    }
}
