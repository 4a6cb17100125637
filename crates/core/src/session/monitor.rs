//! Native inactivity monitor
//!
//! Runs an [`InactivityTimer`] inside a tokio task. The task sleeps until the
//! timer's next deadline and otherwise waits for activity or dismissal
//! commands. Dropping the [`MonitorHandle`] tears the task down; nothing fires
//! after that, though an expiry handler that has already started runs to
//! completion.

use super::activity::ActivityKind;
use super::timer::{InactivityTimer, SessionPhase, TimerEvent};
use crate::config::SessionConfig;
use crate::error::CoreResult;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Snapshot of the monitor's observable state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStatus {
    pub phase: SessionPhase,
    pub warning_visible: bool,
}

#[derive(Debug)]
enum Command {
    Activity(ActivityKind),
    DismissWarning,
}

/// Entry point for starting a monitor
pub struct InactivityMonitor;

impl InactivityMonitor {
    /// Start monitoring with the default one-minute warning lead
    ///
    /// `on_expire` runs once when the expiry deadline passes without activity.
    /// Its error is logged and dropped. Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidConfig`] when `timeout` is zero.
    pub fn start<F, Fut, E>(timeout: Duration, on_expire: F) -> CoreResult<MonitorHandle>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display,
    {
        Self::spawn(InactivityTimer::new(timeout)?, on_expire)
    }

    /// Start monitoring with timeout and warning lead taken from configuration
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidConfig`] when the timeout is zero.
    pub fn start_with<F, Fut, E>(config: &SessionConfig, on_expire: F) -> CoreResult<MonitorHandle>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display,
    {
        let timer = InactivityTimer::new(config.inactivity_timeout())?
            .with_warning_lead(config.warning_lead());
        Self::spawn(timer, on_expire)
    }

    fn spawn<F, Fut, E>(
        mut timer: InactivityTimer<Instant>,
        on_expire: F,
    ) -> CoreResult<MonitorHandle>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display,
    {
        let (commands, mut inbox) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        timer.start(Instant::now());
        let (status_tx, status) = watch::channel(status_of(&timer));
        info!(timeout = ?timer.timeout(), "inactivity monitor started");

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let expired = loop {
                let Some(deadline) = timer.next_deadline() else {
                    break false;
                };

                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break false,
                    command = inbox.recv() => match command {
                        Some(Command::Activity(kind)) => {
                            if timer.record_activity(Instant::now()) {
                                debug!(%kind, "activity reset inactivity timer");
                            }
                        }
                        Some(Command::DismissWarning) => timer.dismiss_warning(),
                        None => break false,
                    },
                    () = sleep_until(deadline) => {
                        let fired = timer.advance(Instant::now());
                        if fired.contains(&TimerEvent::Warning) {
                            info!("session about to expire, warning raised");
                        }
                        if fired.contains(&TimerEvent::Expiry) {
                            status_tx.send_replace(status_of(&timer));
                            break true;
                        }
                    }
                }

                status_tx.send_replace(status_of(&timer));
            };

            // Activity reported from here on is refused
            drop(inbox);

            if expired {
                info!("session expired after inactivity");
                // Detached so that aborting this task cannot cut a sign-out short
                let expiry = tokio::spawn(async move {
                    if let Err(err) = on_expire().await {
                        warn!(error = %err, "session expiry handler failed");
                    }
                });
                let _ = expiry.await;
            }
        });

        Ok(MonitorHandle {
            commands,
            status,
            cancel,
            task: Some(task),
        })
    }
}

fn status_of(timer: &InactivityTimer<Instant>) -> MonitorStatus {
    MonitorStatus {
        phase: timer.phase(),
        warning_visible: timer.warning_visible(),
    }
}

/// Cloneable activity reporter, the native counterpart of an input listener
#[derive(Debug, Clone)]
pub struct ActivitySink {
    commands: mpsc::UnboundedSender<Command>,
}

impl ActivitySink {
    /// Report activity; `false` once the monitor is gone
    pub fn record(&self, kind: ActivityKind) -> bool {
        self.commands.send(Command::Activity(kind)).is_ok()
    }
}

/// Handle to a running monitor
///
/// Dropping the handle cancels both deadlines and detaches every
/// [`ActivitySink`]. An expiry handler already in flight keeps running in the
/// background; use [`MonitorHandle::stop`] to wait for it.
#[derive(Debug)]
pub struct MonitorHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<MonitorStatus>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Report user activity; `false` once the session has expired or the
    /// monitor has stopped
    pub fn record_activity(&self, kind: ActivityKind) -> bool {
        self.commands.send(Command::Activity(kind)).is_ok()
    }

    /// Hide the warning without postponing expiry
    pub fn dismiss_warning(&self) {
        let _ = self.commands.send(Command::DismissWarning);
    }

    /// Whether the expiry warning is currently shown
    #[must_use]
    pub fn warning_visible(&self) -> bool {
        self.status.borrow().warning_visible
    }

    /// Current state snapshot
    #[must_use]
    pub fn status(&self) -> MonitorStatus {
        *self.status.borrow()
    }

    /// Watch state changes, e.g. to render the warning
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.status.clone()
    }

    /// Sink for reporting activity from elsewhere
    #[must_use]
    pub fn activity_sink(&self) -> ActivitySink {
        ActivitySink {
            commands: self.commands.clone(),
        }
    }

    /// Whether the monitor task is still alive
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop monitoring and wait for the task to wind down, including a
    /// running expiry handler
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
