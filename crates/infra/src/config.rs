use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the status server to run on
    pub port: usize,
    /// Upper bound in millis for how long the scheduler waits for a wake
    /// signal before it checks for due `ScheduleRecord`s anyways.
    /// A lost wake signal can never delay a notification by more than this.
    pub scheduler_max_wake_wait_millis: u64,
    /// Lowest time to live in millis a published notification event gets.
    pub min_message_ttl_millis: i64,
    /// Delay in millis between a `Participant` joining a `Game` and the
    /// join confirmation being sent. Gives the roster time to settle.
    pub join_notification_delay_millis: i64,
    /// Maximum number of direct messages in flight for a single dispatch.
    /// The chat platform rate limits aggressively.
    pub dispatch_send_concurrency: usize,
    /// How long in millis a consumed event bus message stays invisible to
    /// other consumers before it is delivered again without an ack.
    pub event_bus_lease_millis: i64,
    /// Endpoint of the chat platform bridge used for direct messages
    pub chat_webhook: Option<ChatWebhookSettings>,
}

#[derive(Debug, Clone)]
pub struct ChatWebhookSettings {
    pub url: String,
    pub key: String,
}

fn parse_env_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn new() -> Self {
        let chat_webhook = match std::env::var("CHAT_WEBHOOK_URL") {
            Ok(url) => Some(ChatWebhookSettings {
                url,
                key: std::env::var("CHAT_WEBHOOK_KEY").unwrap_or_default(),
            }),
            Err(_) => {
                info!("Did not find CHAT_WEBHOOK_URL environment variable. Direct messages will only be logged.");
                None
            }
        };

        let dispatch_send_concurrency = match parse_env_or("DISPATCH_SEND_CONCURRENCY", 5usize) {
            0 => {
                warn!("DISPATCH_SEND_CONCURRENCY must be at least 1, using 1.");
                1
            }
            concurrency => concurrency,
        };

        Self {
            port: parse_env_or("PORT", 5000),
            scheduler_max_wake_wait_millis: parse_env_or("SCHEDULER_MAX_WAKE_WAIT_MILLIS", 5000),
            min_message_ttl_millis: parse_env_or("MIN_MESSAGE_TTL_MILLIS", 1000 * 60), // 1 minute
            join_notification_delay_millis: parse_env_or(
                "JOIN_NOTIFICATION_DELAY_MILLIS",
                1000 * 60,
            ),
            dispatch_send_concurrency,
            event_bus_lease_millis: parse_env_or("EVENT_BUS_LEASE_MILLIS", 1000 * 60 * 5), // 5 minutes
            chat_webhook,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn falls_back_to_defaults_for_invalid_values() {
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("DISPATCH_SEND_CONCURRENCY", "0");
        std::env::set_var("SCHEDULER_MAX_WAKE_WAIT_MILLIS", "2500");
        std::env::remove_var("CHAT_WEBHOOK_URL");

        let config = Config::new();
        assert_eq!(config.port, 5000);
        assert_eq!(config.dispatch_send_concurrency, 1);
        assert_eq!(config.scheduler_max_wake_wait_millis, 2500);
        assert_eq!(config.min_message_ttl_millis, 60_000);
        assert_eq!(config.event_bus_lease_millis, 300_000);
        assert!(config.chat_webhook.is_none());

        std::env::remove_var("PORT");
        std::env::remove_var("DISPATCH_SEND_CONCURRENCY");
        std::env::remove_var("SCHEDULER_MAX_WAKE_WAIT_MILLIS");
    }

    #[test]
    #[serial]
    fn reads_chat_webhook_settings() {
        std::env::set_var("CHAT_WEBHOOK_URL", "http://localhost:9999/dm");
        std::env::set_var("CHAT_WEBHOOK_KEY", "secret");

        let webhook = Config::new().chat_webhook.expect("Webhook to be configured");
        assert_eq!(webhook.url, "http://localhost:9999/dm");
        assert_eq!(webhook.key, "secret");

        std::env::remove_var("CHAT_WEBHOOK_URL");
        std::env::remove_var("CHAT_WEBHOOK_KEY");
    }
}
