pub mod context;

pub use context::{SessionAction, SessionHandle, SessionProvider, SessionState, use_session};
