//! Inactivity timeout state machine
//!
//! The machine owns two deadlines, a warning and an expiry, both measured from
//! the last arming. Drivers never keep timer handles of their own: they ask for
//! [`InactivityTimer::next_deadline`], sleep until then, and call
//! [`InactivityTimer::advance`]. Re-arming replaces both deadlines in place, so
//! there is never more than one pending warning and one pending expiry.
//!
//! ```text
//! Idle    --start-->                       Active
//! Active  --warning deadline-->            Warned
//! Warned  --expiry deadline-->             Expired (TimerEvent::Expiry, once)
//! Active|Warned --activity-->              Active (both deadlines re-armed)
//! Warned  --dismiss_warning-->             Warned, warning hidden
//! Expired --start-->                       Active
//! ```
//!
//! The clock type is generic so the same machine runs on `tokio::time::Instant`,
//! on a browser page clock, or on plain `Duration` offsets in tests.

use crate::error::{CoreError, CoreResult};
use std::ops::Add;
use std::time::Duration;

/// How long before expiry the warning is raised by default
pub const DEFAULT_WARNING_LEAD: Duration = Duration::from_secs(60);

/// Lifecycle phase of a monitored session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Not started, or stopped
    #[default]
    Idle,
    Active,
    Warned,
    /// Expiry fired; inert until started again
    Expired,
}

/// A deadline that came due during [`InactivityTimer::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    Warning,
    Expiry,
}

/// Warning/expiry deadline pair driven by user activity
#[derive(Debug, Clone)]
pub struct InactivityTimer<I> {
    timeout: Duration,
    warning_lead: Duration,
    warning_at: Option<I>,
    expires_at: Option<I>,
    warning_visible: bool,
    phase: SessionPhase,
}

impl<I> InactivityTimer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create an unarmed timer
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] when `timeout` is zero.
    pub fn new(timeout: Duration) -> CoreResult<Self> {
        if timeout.is_zero() {
            return Err(CoreError::invalid_config(
                "inactivity timeout must be positive",
            ));
        }
        Ok(Self {
            timeout,
            warning_lead: DEFAULT_WARNING_LEAD,
            warning_at: None,
            expires_at: None,
            warning_visible: false,
            phase: SessionPhase::Idle,
        })
    }

    /// Raise the warning `lead` before expiry instead of one minute
    #[must_use]
    pub fn with_warning_lead(mut self, lead: Duration) -> Self {
        self.warning_lead = lead;
        self
    }

    /// Configured inactivity timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Offset from arming at which the warning fires, clamped at zero
    #[must_use]
    pub const fn warning_offset(&self) -> Duration {
        self.timeout.saturating_sub(self.warning_lead)
    }

    /// Arm both deadlines from `now`, replacing any pending ones
    pub fn start(&mut self, now: I) {
        self.arm(now);
        tracing::trace!(timeout = ?self.timeout, "inactivity timer armed");
    }

    /// Reset both deadlines after user activity
    ///
    /// Returns `false` and does nothing when the timer is idle or expired.
    pub fn record_activity(&mut self, now: I) -> bool {
        match self.phase {
            SessionPhase::Active | SessionPhase::Warned => {
                self.arm(now);
                tracing::trace!("inactivity timer reset by activity");
                true
            }
            SessionPhase::Idle | SessionPhase::Expired => false,
        }
    }

    /// Hide the warning; the expiry deadline keeps running
    pub fn dismiss_warning(&mut self) {
        self.warning_visible = false;
    }

    /// Cancel both deadlines
    pub fn stop(&mut self) {
        self.warning_at = None;
        self.expires_at = None;
        self.warning_visible = false;
        self.phase = SessionPhase::Idle;
    }

    /// Earliest pending deadline, the only wake-up a driver needs
    #[must_use]
    pub fn next_deadline(&self) -> Option<I> {
        match (self.warning_at, self.expires_at) {
            (Some(warning), Some(expiry)) => Some(warning.min(expiry)),
            (warning, expiry) => warning.or(expiry),
        }
    }

    /// Fire every deadline due at `now`, warning before expiry
    pub fn advance(&mut self, now: I) -> Vec<TimerEvent> {
        let mut fired = Vec::new();

        if self.warning_at.is_some_and(|at| at <= now) {
            self.warning_at = None;
            self.warning_visible = true;
            self.phase = SessionPhase::Warned;
            fired.push(TimerEvent::Warning);
        }

        if self.expires_at.is_some_and(|at| at <= now) {
            self.expires_at = None;
            self.warning_at = None;
            self.warning_visible = false;
            self.phase = SessionPhase::Expired;
            fired.push(TimerEvent::Expiry);
        }

        fired
    }

    /// Whether the "about to expire" notice should be shown
    #[must_use]
    pub const fn warning_visible(&self) -> bool {
        self.warning_visible
    }

    /// Current lifecycle phase
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Pending expiry deadline
    #[must_use]
    pub const fn expires_at(&self) -> Option<I> {
        self.expires_at
    }

    fn arm(&mut self, now: I) {
        self.warning_at = Some(now + self.warning_offset());
        self.expires_at = Some(now + self.timeout);
        self.warning_visible = false;
        self.phase = SessionPhase::Active;
    }
}
