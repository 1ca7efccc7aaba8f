//! HTTP client side of the chess backend: a request/response gateway for
//! manual announcement triggers and a supervised server-sent-events reader
//! for the live move stream.

mod consts;
mod error;

pub mod gateway;
pub mod stream;
pub mod types;

pub use consts::{DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
pub use error::BackendError;
pub use gateway::{Gateway, HttpGateway};
pub use stream::{PushStream, RetryPolicy, StreamState, StreamSupervisor, StreamUpdate};
pub use types::{HealthResponse, MoveEvent};
