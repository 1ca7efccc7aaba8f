//! Session logic for the glasses app: device-facing traits, the announcement
//! renderer, and the per-session controller that turns button presses and
//! stream events into things the wearer sees and hears.

pub mod announce;
pub mod app;
pub mod device;
pub mod session;

/// Which delivery path a deployment uses for move events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// The backend pushes moves over a long-lived event stream; the button
    /// doubles as a stream health check.
    PushStream,
    /// Nothing is pushed; every button press asks the backend for the latest
    /// move.
    OnDemand,
}
