//! Session management module.
//!
//! This module provides the session lifecycle, its attribute store, the
//! anti-forgery token guard, and the storage drivers sessions persist to.

mod clock;
mod context;
pub mod handler;
mod id;
mod lifecycle;
mod state;
mod store;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use context::RequestContext;
pub use handler::{FileHandler, MemoryHandler, SessionHandler, SessionRecord};
pub use id::SessionId;
pub use lifecycle::{Session, SessionConfig, CLIENT_ADDRESS_ATTRIBUTE, CLIENT_BROWSER_ATTRIBUTE};
pub use state::SessionState;
pub use store::{AttributeMap, AttributeStore, Iter};
