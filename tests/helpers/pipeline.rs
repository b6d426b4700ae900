use super::setup::TestContext;
use game_notifier_api::{
    notification::{
        claim_due_schedules::{ClaimDueSchedulesUseCase, ClaimReport},
        dispatch_notification::{DispatchNotificationUseCase, DispatchOutcome},
    },
    shared::usecase::execute,
};
use game_notifier_api_structs::notification_event::NotificationEvent;
use game_notifier_infra::IEventBus;
use std::time::Duration;

/// One pass of the scheduler loop
pub async fn run_scheduler_cycle(ctx: &TestContext) -> ClaimReport {
    execute(ClaimDueSchedulesUseCase {}, &ctx.ctx)
        .await
        .expect("Claim cycle to succeed")
}

/// Consumes and dispatches everything currently queued on `topic`
pub async fn dispatch_queued(ctx: &TestContext, topic: &str) -> Vec<(NotificationEvent, DispatchOutcome)> {
    let mut outcomes = Vec::new();
    while let Ok(delivery) =
        tokio::time::timeout(Duration::from_millis(50), ctx.event_bus.consume(topic)).await
    {
        let delivery = delivery.expect("Event bus to be open");
        let event = NotificationEvent::from_bytes(&delivery.payload).expect("Valid payload");
        let outcome = execute(
            DispatchNotificationUseCase {
                event: event.clone(),
            },
            &ctx.ctx,
        )
        .await
        .expect("Dispatch to succeed");
        ctx.ctx
            .event_bus
            .ack(&delivery)
            .await
            .expect("Ack to succeed");
        outcomes.push((event, outcome));
    }
    outcomes
}
