//! User input that counts as activity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Input signals that reset the inactivity timeout
///
/// Exactly these four; focus and visibility changes are not activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerDown,
    KeyDown,
    Scroll,
    TouchStart,
}

impl ActivityKind {
    /// Every activity signal, in listener registration order
    pub const ALL: [Self; 4] = [
        Self::PointerDown,
        Self::KeyDown,
        Self::Scroll,
        Self::TouchStart,
    ];

    /// DOM event name the browser listener subscribes to
    #[must_use]
    pub const fn dom_event(self) -> &'static str {
        match self {
            Self::PointerDown => "mousedown",
            Self::KeyDown => "keydown",
            Self::Scroll => "scroll",
            Self::TouchStart => "touchstart",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_event())
    }
}
