//! Input events as seen by the matching engine

use std::fmt;

/// Category of an input code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Keyboard key, identified by its evdev key code
    Key,
    /// Pointer button, identified by its X11 button number
    Button,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Key => write!(f, "key"),
            Channel::Button => write!(f, "button"),
        }
    }
}

/// A single press or release.
///
/// The input source guarantees events are already free of autorepeat and
/// duplicate transitions. `code` is not range-checked here; the consumer
/// rejects codes outside the hotkey code space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub channel: Channel,
    pub code: u16,
    pub pressed: bool,
}

impl Event {
    pub fn press(channel: Channel, code: u16) -> Self {
        Self {
            channel,
            code,
            pressed: true,
        }
    }

    pub fn release(channel: Channel, code: u16) -> Self {
        Self {
            channel,
            code,
            pressed: false,
        }
    }
}
