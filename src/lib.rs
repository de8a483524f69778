//! # session-keeper
//!
//! Server-side visitor sessions with pluggable storage.
//!
//! A [`Session`] carries string-keyed attributes across requests, keyed by
//! an unguessable [`SessionId`] that travels in a cookie. Sessions move
//! through a small lifecycle (start, close, restart, fork, destroy, abort),
//! guard forms with an anti-forgery token, and persist through a
//! [`SessionHandler`] storage driver.
//!
//! ## Features
//!
//! - **Lifecycle**: explicit [`SessionState`] transitions with resume on start
//! - **Token guard**: per-session anti-forgery token with constant-time checks
//! - **Storage drivers**: in-memory and one-file-per-session, with write leases
//!   and garbage collection
//! - **Console**: text descriptor for command listings and help, plus the
//!   `session-keeper` maintenance commands
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_keeper::{MemoryHandler, RequestContext, Session, SessionConfig};
//!
//! fn main() -> session_keeper::Result<()> {
//!     session_keeper::logging::try_init().ok();
//!
//!     let handler = Arc::new(MemoryHandler::new());
//!     let mut session = Session::new(handler, SessionConfig::default());
//!
//!     let request = RequestContext::from_cookie_header("session_keeper=abc123");
//!     session.start(&request)?;
//!     session.set("cart.items", 3)?;
//!
//!     let token = session.get_token(false)?;
//!     assert!(session.has_token(&token, true)?);
//!
//!     session.close()?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod online;
pub mod pagination;
pub mod session;

// Re-export commonly used types
pub use commands::Console;
pub use config::{Config, ConfigError, HandlerKind};
pub use console::{
    ApplicationInfo, BufferedOutput, CommandInfo, DescriptorOptions, OutputSink, StreamOutput,
    TextDescriptor,
};
pub use error::{Result, SessionError};
pub use online::{OnlineCount, OnlineReport, ShowMode, WhosOnline};
pub use pagination::{Pagination, PaginationObject};
pub use session::{
    AttributeMap, Clock, FileHandler, ManualClock, MemoryHandler, RequestContext, Session,
    SessionConfig, SessionHandler, SessionId, SessionRecord, SessionState, SystemClock,
};
