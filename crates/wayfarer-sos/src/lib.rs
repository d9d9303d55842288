//! Emergency alert subsystem.
//!
//! Loads a user's emergency contacts (primary store with a local file
//! fallback), composes one alert per trigger and dispatches it to every
//! contact through an outbound [`channel::AlertChannel`], tolerating
//! per-contact delivery failures.

pub mod channel;
pub mod composer;
pub mod error;
pub mod service;
pub mod store;

pub use channel::{channel_from_config, AlertChannel, SimulatedChannel, WebhookChannel};
pub use error::SosError;
pub use service::{SosOutcome, SosReply, SosReport, SosService, NO_CONTACTS_TEXT};
pub use store::{ContactStore, LocalContactFile};
