//! Sitewatch alerting infrastructure.
//!
//! - [`EventBus`]: ordered fire-and-forget UI event channel backed by
//!   `tokio::sync::mpsc`.
//! - [`AlertThrottle`]: per-channel minimum spacing between successful sends,
//!   timed by a [`Clock`].
//! - [`NotificationDispatcher`]: aggregate alert dispatch with escalation
//!   policy.
//! - [`delivery`]: external delivery channels (email, webhook).

pub mod bus;
pub mod delivery;
pub mod dispatcher;
pub mod throttle;

pub use bus::{EventBus, UiCallbacks, UiEvent, WarningTarget};
pub use delivery::email::EmailDelivery;
pub use delivery::webhook::WebhookDelivery;
pub use delivery::{AlertChannel, DeliveryError};
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use throttle::{AlertThrottle, Clock, SystemClock};
