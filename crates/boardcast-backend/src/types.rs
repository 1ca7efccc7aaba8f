use serde::{Deserialize, Serialize};

/// Body of `POST /sendMsg`. `message` carries the trigger reason; the backend
/// echoes back whatever it wants announced.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub message: String,
    pub user_id: String,
}

/// Body of a `POST /sendMsg` response. Only `message` is meaningful and even
/// that is not guaranteed to be present.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// One decoded event from the move stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoveEvent {
    pub message: String,
    /// Seconds on the backend's event-loop clock. Informational only.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_event_tolerates_missing_timestamp_and_extra_fields() {
        let event: MoveEvent =
            serde_json::from_str(r#"{"message": "Rook to B1", "board": "..."}"#).unwrap();
        assert_eq!(event.message, "Rook to B1");
        assert_eq!(event.timestamp, None);

        let event: MoveEvent =
            serde_json::from_str(r#"{"message": "Knight to F3", "timestamp": 12.5}"#).unwrap();
        assert_eq!(event.timestamp, Some(12.5));
    }

    #[test]
    fn message_request_serializes_both_fields() {
        let body = MessageRequest {
            message: "button_press".to_string(),
            user_id: "user-1".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "button_press");
        assert_eq!(json["user_id"], "user-1");
    }
}
