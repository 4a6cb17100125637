//! Session lifecycle: inactivity timeout and the owned session context

pub mod activity;
pub mod context;
pub mod timer;

#[cfg(feature = "runtime")]
pub mod monitor;

pub use activity::ActivityKind;
pub use context::SessionContext;
pub use timer::{DEFAULT_WARNING_LEAD, InactivityTimer, SessionPhase, TimerEvent};
