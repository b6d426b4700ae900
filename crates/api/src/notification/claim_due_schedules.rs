use crate::shared::usecase::UseCase;
use game_notifier_api_structs::notification_event::{topic_for, NotificationEvent};
use game_notifier_domain::ScheduleRecord;
use game_notifier_infra::NotifyContext;
use tracing::{debug, error};

/// Claims every due `ScheduleRecord` and publishes one `NotificationEvent`
/// per claimed record.
///
/// Claiming happens before publishing. A publish that fails after the claim
/// leaves a record that is marked as sent but was never delivered. That gap
/// is logged and not retried, since retrying would mean releasing the claim
/// again and racing other schedulers for it.
#[derive(Debug)]
pub struct ClaimDueSchedulesUseCase {}

#[derive(Debug, Default, PartialEq)]
pub struct ClaimReport {
    pub claimed: usize,
    pub published: usize,
    /// Records another scheduler claimed first
    pub lost_races: usize,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

async fn publish(record: &ScheduleRecord, now: i64, ctx: &NotifyContext) -> bool {
    let payload = match NotificationEvent::new(record).to_bytes() {
        Ok(payload) => payload,
        Err(e) => {
            error!(
                "Delivery gap: unable to serialize event for schedule record: {}. Err: {:?}",
                record.id, e
            );
            return false;
        }
    };
    let ttl = record.message_ttl_millis(now, ctx.config.min_message_ttl_millis);

    match ctx
        .event_bus
        .publish(topic_for(record.kind), payload, Some(ttl))
        .await
    {
        Ok(()) => true,
        Err(e) => {
            error!(
                "Delivery gap: schedule record: {} was claimed but could not be published. Err: {:?}",
                record.id, e
            );
            false
        }
    }
}

#[async_trait::async_trait]
impl UseCase for ClaimDueSchedulesUseCase {
    type Response = ClaimReport;

    type Error = UseCaseError;

    const NAME: &'static str = "ClaimDueSchedules";

    async fn execute(&mut self, ctx: &NotifyContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let due = ctx
            .repos
            .schedule_records
            .select_due_unsent(now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        let mut report = ClaimReport::default();
        for record in due {
            match ctx.repos.schedule_records.try_claim(&record.id).await {
                Ok(true) => report.claimed += 1,
                Ok(false) => {
                    debug!("Schedule record: {} was already claimed", record.id);
                    report.lost_races += 1;
                    continue;
                }
                Err(e) => {
                    // Still unsent, so the next cycle picks it up again
                    error!(
                        "Unable to claim schedule record: {}. Err: {:?}",
                        record.id, e
                    );
                    continue;
                }
            }

            if publish(&record, now, ctx).await {
                report.published += 1;
            }
        }

        Ok(report)
    }
}
