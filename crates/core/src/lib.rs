//! Unidash core types and session lifecycle
//!
//! Shared between the browser frontend, the HTTP clients and the CLI. Nothing in
//! this crate performs I/O; the native inactivity monitor (feature `runtime`)
//! only spawns timers on the ambient tokio runtime.

pub mod config;
pub mod error;
pub mod format;
pub mod identity;
pub mod models;
pub mod session;
pub mod validation;

#[cfg(test)]
mod tests;

pub use config::{ApiConfig, IdentityConfig, RefreshFailurePolicy, SessionConfig, UnidashConfig};
pub use error::{AuthError, CoreError, CoreResult};
pub use identity::{AuthUser, IdentityProvider, Navigator, Session, UserRole};
pub use session::{ActivityKind, InactivityTimer, SessionContext, SessionPhase, TimerEvent};
pub use validation::{ValidateConfig, ValidationError, validators};

#[cfg(feature = "runtime")]
pub use session::monitor::{ActivitySink, InactivityMonitor, MonitorHandle, MonitorStatus};
