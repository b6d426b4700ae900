use game_notifier_domain::{NotificationKind, ScheduleRecord, ID};
use serde::{Deserialize, Serialize};

pub mod notification_event {
    use super::*;

    /// Payload published on the event bus for every claimed `ScheduleRecord`.
    ///
    /// Deliberately minimal: the dispatcher re-reads the `Game` and its roster
    /// when the event arrives since both may have changed after scheduling.
    #[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NotificationEvent {
        pub game_id: ID,
        pub kind: NotificationKind,
        pub participant_id: Option<ID>,
    }

    impl NotificationEvent {
        pub fn new(record: &ScheduleRecord) -> Self {
            Self {
                game_id: record.game_id,
                kind: record.kind,
                participant_id: record.participant_id,
            }
        }

        pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
            serde_json::to_vec(self)
        }

        pub fn from_bytes(payload: &[u8]) -> serde_json::Result<Self> {
            serde_json::from_slice(payload)
        }
    }

    /// Topic the event for a notification of `kind` is routed to
    pub fn topic_for(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::Reminder => "notifications.reminder",
            NotificationKind::JoinNotification => "notifications.join",
        }
    }

    pub fn all_topics() -> [&'static str; 2] {
        [
            topic_for(NotificationKind::Reminder),
            topic_for(NotificationKind::JoinNotification),
        ]
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn payload_uses_camel_case_fields() {
            let event = NotificationEvent {
                game_id: "a574624d-7c7f-456c-bbdd-670710302d45".parse().unwrap(),
                kind: NotificationKind::JoinNotification,
                participant_id: None,
            };
            let json = String::from_utf8(event.to_bytes().unwrap()).unwrap();
            assert_eq!(
                json,
                r#"{"gameId":"a574624d-7c7f-456c-bbdd-670710302d45","kind":"join_notification","participantId":null}"#
            );
            assert_eq!(NotificationEvent::from_bytes(json.as_bytes()).unwrap(), event);
        }

        #[test]
        fn kinds_route_to_distinct_topics() {
            let [reminder, join] = all_topics();
            assert_ne!(reminder, join);
        }
    }
}
