pub mod use_inactivity_timeout;

pub use use_inactivity_timeout::{InactivityHandle, use_inactivity_timeout};
