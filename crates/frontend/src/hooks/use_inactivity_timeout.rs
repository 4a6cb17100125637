//! Browser driver for the inactivity timer
//!
//! One `InactivityTimer` per mounted session, fed by four window listeners.
//! At most one `setTimeout` is pending at any time: it targets the timer's
//! next deadline and is replaced whenever activity re-arms the timer.

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use std::cell::RefCell;
use std::ops::Add;
use std::rc::{Rc, Weak};
use std::time::Duration;
use unidash_core::{ActivityKind, InactivityTimer, TimerEvent};
use yew::prelude::*;

/// Longest delay `setTimeout` honours without overflowing
const MAX_TIMEOUT_MS: u32 = i32::MAX as u32;

/// Milliseconds since the epoch as seen by the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PageTime(Duration);

impl PageTime {
    fn now() -> Self {
        Self(Duration::from_secs_f64(js_sys::Date::now().max(0.0) / 1000.0))
    }

    fn until(self, later: Self) -> Duration {
        later.0.saturating_sub(self.0)
    }
}

impl Add<Duration> for PageTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

struct Driver {
    timer: InactivityTimer<PageTime>,
    pending: Option<Timeout>,
    set_warning: UseStateSetter<bool>,
    on_expire: Rc<RefCell<Callback<()>>>,
}

type SharedDriver = Rc<RefCell<Driver>>;

/// Replace the pending timeout with one for the next deadline
fn reschedule(driver: &SharedDriver) {
    let weak = Rc::downgrade(driver);
    let mut inner = driver.borrow_mut();
    inner.pending = None;

    let Some(deadline) = inner.timer.next_deadline() else {
        return;
    };
    let delay = PageTime::now().until(deadline);
    let millis = u32::try_from(delay.as_millis())
        .unwrap_or(MAX_TIMEOUT_MS)
        .min(MAX_TIMEOUT_MS);

    inner.pending = Some(Timeout::new(millis, move || {
        if let Some(driver) = weak.upgrade() {
            fire(&driver);
        }
    }));
}

fn fire(driver: &SharedDriver) {
    let (events, set_warning, on_expire) = {
        let mut inner = driver.borrow_mut();
        inner.pending = None;
        let events = inner.timer.advance(PageTime::now());
        (events, inner.set_warning.clone(), inner.on_expire.borrow().clone())
    };

    // Browsers may run a timeout a little early; rescheduling covers it
    reschedule(driver);

    for event in events {
        match event {
            TimerEvent::Warning => {
                tracing::info!("inactivity warning shown");
                set_warning.set(true);
            }
            TimerEvent::Expiry => {
                tracing::info!("inactivity timeout reached, ending session");
                set_warning.set(false);
                on_expire.emit(());
            }
        }
    }
}

fn on_activity(driver: &SharedDriver, kind: ActivityKind) {
    let rearmed = {
        let mut inner = driver.borrow_mut();
        let was_visible = inner.timer.warning_visible();
        let rearmed = inner.timer.record_activity(PageTime::now());
        if rearmed && was_visible {
            inner.set_warning.set(false);
        }
        rearmed
    };
    if rearmed {
        tracing::trace!(%kind, "activity");
        reschedule(driver);
    }
}

/// Listeners and timer of one monitored session; dropping it stops both
struct Watch {
    driver: SharedDriver,
    _listeners: Vec<EventListener>,
}

impl Watch {
    fn start(
        timer: InactivityTimer<PageTime>,
        set_warning: UseStateSetter<bool>,
        on_expire: Rc<RefCell<Callback<()>>>,
    ) -> Self {
        let driver = Rc::new(RefCell::new(Driver {
            timer,
            pending: None,
            set_warning,
            on_expire,
        }));
        driver.borrow_mut().timer.start(PageTime::now());
        reschedule(&driver);

        let window = gloo::utils::window();
        let listeners = ActivityKind::ALL
            .into_iter()
            .map(|kind| {
                let weak = Rc::downgrade(&driver);
                EventListener::new(&window, kind.dom_event(), move |_| {
                    if let Some(driver) = weak.upgrade() {
                        on_activity(&driver, kind);
                    }
                })
            })
            .collect();

        Self {
            driver,
            _listeners: listeners,
        }
    }

    fn weak(&self) -> Weak<RefCell<Driver>> {
        Rc::downgrade(&self.driver)
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        let mut inner = self.driver.borrow_mut();
        inner.pending = None;
        inner.timer.stop();
    }
}

/// What a component needs to render the warning
#[derive(Clone, PartialEq)]
pub struct InactivityHandle {
    pub warning_visible: bool,
    /// Hide the warning without resetting the expiry
    pub dismiss_warning: Callback<()>,
}

/// Sign the user out after `timeout` without input
///
/// While `enabled`, mouse, keyboard, scroll and touch input on the window
/// re-arm the timer. The warning becomes visible `lead` before expiry and
/// `on_expire` runs once when the timeout is reached. Turning `enabled` off
/// or unmounting cancels everything.
#[hook]
pub fn use_inactivity_timeout(
    enabled: bool,
    timeout: Duration,
    lead: Duration,
    on_expire: Callback<()>,
) -> InactivityHandle {
    let warning_visible = use_state_eq(|| false);
    let driver_ref = use_mut_ref(Weak::<RefCell<Driver>>::new);

    // Latest callback, read when the expiry fires
    let on_expire_ref = use_mut_ref(|| on_expire.clone());
    *on_expire_ref.borrow_mut() = on_expire;

    {
        let set_warning = warning_visible.setter();
        let driver_ref = driver_ref.clone();
        let on_expire_ref = on_expire_ref.clone();
        use_effect_with((enabled, timeout, lead), move |&(enabled, timeout, lead)| {
            set_warning.set(false);
            let watch = if enabled {
                match InactivityTimer::new(timeout) {
                    Ok(timer) => Some(Watch::start(
                        timer.with_warning_lead(lead),
                        set_warning,
                        on_expire_ref,
                    )),
                    Err(err) => {
                        tracing::warn!(error = %err, "inactivity timeout disabled");
                        None
                    }
                }
            } else {
                None
            };
            *driver_ref.borrow_mut() = watch.as_ref().map(Watch::weak).unwrap_or_default();

            move || drop(watch)
        });
    }

    let dismiss_warning = {
        let set_warning = warning_visible.setter();
        Callback::from(move |()| {
            if let Some(driver) = driver_ref.borrow().upgrade() {
                driver.borrow_mut().timer.dismiss_warning();
            }
            set_warning.set(false);
        })
    };

    InactivityHandle {
        warning_visible: *warning_visible,
        dismiss_warning,
    }
}
