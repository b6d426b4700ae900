use crate::{
    notification::{
        claim_due_schedules::ClaimDueSchedulesUseCase,
        dispatch_notification::DispatchNotificationUseCase,
    },
    shared::usecase::execute,
};
use game_notifier_api_structs::notification_event::{all_topics, NotificationEvent};
use game_notifier_infra::{Delivery, EventBusError, NotifyContext, WakeReason};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Backoff before a failed delivery is handed back to the event bus
pub fn get_redelivery_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    Duration::from_millis(500 * 2u64.pow(exponent))
}

/// Claims and publishes due notifications whenever the wake channel fires
/// and at least every `scheduler_max_wake_wait_millis`.
///
/// Holds no state between cycles, every cycle asks the store for whatever
/// is due, so restarting it is always safe.
pub fn start_scheduler_loop(ctx: NotifyContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        let max_wait = Duration::from_millis(ctx.config.scheduler_max_wake_wait_millis);
        loop {
            let _ = execute(ClaimDueSchedulesUseCase {}, &ctx).await;

            if ctx.wake.wait(max_wait).await == WakeReason::Signalled {
                debug!("Scheduler woken up by a schedule record change");
            }
        }
    })
}

/// Starts one consumer per notification topic. Every delivery is handled on
/// its own task, serialized per `Game`.
pub fn start_dispatcher(ctx: NotifyContext) -> Vec<JoinHandle<()>> {
    all_topics()
        .into_iter()
        .map(|topic| tokio::spawn(consume_topic(topic, ctx.clone())))
        .collect()
}

async fn consume_topic(topic: &'static str, ctx: NotifyContext) {
    loop {
        let delivery = match ctx.event_bus.consume(topic).await {
            Ok(delivery) => delivery,
            Err(EventBusError::Closed) => {
                info!("Event bus closed, stopping consumer of topic: {}", topic);
                return;
            }
            Err(e) => {
                error!("Unable to consume from topic: {}. Err: {:?}", topic, e);
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        tokio::spawn(handle_delivery(delivery, ctx.clone()));
    }
}

async fn handle_delivery(delivery: Delivery, ctx: NotifyContext) {
    let event = match NotificationEvent::from_bytes(&delivery.payload) {
        Ok(event) => event,
        Err(e) => {
            // Redelivering it would never succeed
            error!(
                "Dropping malformed event on topic: {}. Err: {:?}",
                delivery.topic, e
            );
            ack(&delivery, &ctx).await;
            return;
        }
    };

    let guard = ctx.game_locks.lock(&event.game_id).await;
    let res = execute(DispatchNotificationUseCase { event }, &ctx).await;
    drop(guard);

    match res {
        Ok(_) => ack(&delivery, &ctx).await,
        Err(_) => {
            tokio::time::sleep(get_redelivery_delay(delivery.attempt)).await;
            if let Err(e) = ctx.event_bus.nack(&delivery).await {
                error!(
                    "Unable to nack delivery: {} on topic: {}. Err: {:?}",
                    delivery.delivery_tag, delivery.topic, e
                );
            }
        }
    }
}

async fn ack(delivery: &Delivery, ctx: &NotifyContext) {
    if let Err(e) = ctx.event_bus.ack(delivery).await {
        error!(
            "Unable to ack delivery: {} on topic: {}. Err: {:?}",
            delivery.delivery_tag, delivery.topic, e
        );
    }
}
