//! Meditour Cookie Consent
//!
//! Categories and consent rules:
//! | Category   | Default | Revocable |
//! | Essential  | Granted | No        |
//! | Functional | Denied  | Yes       |
//! | Analytics  | Denied  | Yes       |
//! | Marketing  | Denied  | Yes       |
//!
//! The consent state is persisted as JSON in a durable cookie and mirrored
//! to a local backup store.

mod category;
mod definition;
mod error;
mod registry;
mod state;
mod store;

pub use category::{CookieCategory, GdprBasis};
pub use definition::{default_catalog, CookieDefinition, CONSENT_COOKIE};
pub use error::ConsentError;
pub use registry::CookieRegistry;
pub use state::{ConsentState, ConsentUpdate};
pub use store::{ConsentListener, ConsentSettings, ConsentStore, ListenerId};

pub type Result<T> = std::result::Result<T, ConsentError>;
