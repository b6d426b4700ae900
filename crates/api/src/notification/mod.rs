pub mod claim_due_schedules;
mod delivery;
pub mod dispatch_notification;
mod messages;
pub mod notify_promotions;

pub use delivery::{deliver_all, DeliveryReport, OutgoingMessage};
