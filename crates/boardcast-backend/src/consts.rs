use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const SEND_MSG_PATH: &str = "/sendMsg";
pub const EVENTS_PATH: &str = "/events";
pub const HEALTH_PATH: &str = "/health";

/// Substituted when the backend answers without a `message` field.
pub const MISSING_MESSAGE_TEXT: &str = "No move received";

/// Overall deadline for request/response calls against the backend.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect deadline for the event-stream client. The stream itself has no
/// overall deadline; it stays open until one side closes it.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
