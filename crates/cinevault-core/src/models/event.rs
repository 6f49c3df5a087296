//! Usage analytics events
//!
//! Events are ephemeral: serialized to JSON for the broker and never stored
//! locally. Field names are part of the downstream consumer contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A movie detail page was fetched
    VideoVisit,
    /// A movie download/stream was started
    VideoStreamed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event: EventKind,
    pub movie_id: i64,
    pub movie_title: String,
    pub user_id: i64,
    pub user_ip: String,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(
        event: EventKind,
        movie_id: i64,
        movie_title: impl Into<String>,
        user_id: i64,
        user_ip: impl Into<String>,
    ) -> Self {
        Self {
            event,
            movie_id,
            movie_title: movie_title.into(),
            user_id,
            user_ip: user_ip.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The serialized field names are consumed downstream; keep them stable.
    #[test]
    fn test_event_wire_format() {
        let event = AnalyticsEvent::new(EventKind::VideoStreamed, 42, "Night Train", 7, "10.0.0.1");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "video_streamed");
        assert_eq!(json["movie_id"], 42);
        assert_eq!(json["movie_title"], "Night Train");
        assert_eq!(json["user_id"], 7);
        assert_eq!(json["user_ip"], "10.0.0.1");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_visit_kind_serializes_snake_case() {
        let json = serde_json::to_value(EventKind::VideoVisit).unwrap();
        assert_eq!(json, "video_visit");
    }
}
