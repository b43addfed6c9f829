//! Session record model
//!
//! Wire shape: `{ id, createdAt, updatedAt, userId, __typename }`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator stored on every session item (single-table design).
pub const SESSION_TYPENAME: &str = "Session";

/// A session item as stored in the key-value table.
///
/// `created_at` and `typename` are optional because an upsert against an
/// unknown id writes a partial item carrying only `id`, `userId` and `updatedAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(rename = "updatedAt")]
    pub updated_at: String,

    /// `None` for anonymous (guest) sessions. Always serialized, as `null` when absent.
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,

    #[serde(rename = "__typename", default, skip_serializing_if = "Option::is_none")]
    pub typename: Option<String>,
}

impl Session {
    /// Build a complete record for a new session. `createdAt == updatedAt`.
    pub fn new(id: String, user_id: Option<String>, now: DateTime<Utc>) -> Self {
        let ts = format_timestamp(now);
        Session {
            id,
            created_at: Some(ts.clone()),
            updated_at: ts,
            user_id,
            typename: Some(SESSION_TYPENAME.to_string()),
        }
    }

    /// Anonymous sessions have no associated user
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    /// Session items carry `__typename = "Session"`; partial items carry none.
    /// Anything else belongs to another entity kind sharing the table.
    pub fn is_session_kind(&self) -> bool {
        self.typename
            .as_deref()
            .map_or(true, |kind| kind == SESSION_TYPENAME)
    }

    /// Whether the item was written by an upsert and never created properly
    pub fn is_partial(&self) -> bool {
        self.created_at.is_none()
    }
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Source of "now" for record timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use super::Clock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Mutex;

    /// Clock that advances one second on every read.
    pub struct StepClock {
        next: Mutex<DateTime<Utc>>,
    }

    impl StepClock {
        pub fn new() -> Self {
            StepClock {
                next: Mutex::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            }
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            let mut next = self.next.lock().unwrap();
            let now = *next;
            *next = now + Duration::seconds(1);
            now
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn test_new_session_wire_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let session = Session::new("abc".to_string(), None, ts);
        assert!(session.is_anonymous());
        assert_eq!(session.created_at.as_deref(), Some(session.updated_at.as_str()));

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "abc",
                "createdAt": "2024-05-01T12:00:00.000Z",
                "updatedAt": "2024-05-01T12:00:00.000Z",
                "userId": null,
                "__typename": "Session",
            })
        );
    }

    #[test]
    fn test_partial_item_deserializes() {
        let session: Session = serde_json::from_str(
            r#"{"id":"abc","userId":"u2","updatedAt":"2024-05-01T12:00:00.000Z"}"#,
        )
        .unwrap();
        assert!(session.is_partial());
        assert_eq!(session.user_id.as_deref(), Some("u2"));

        // createdAt/__typename stay absent on the way back out
        let json = serde_json::to_value(&session).unwrap();
        assert!(json.get("createdAt").is_none());
        assert!(json.get("__typename").is_none());
    }
}
