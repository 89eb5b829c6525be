//! Event source backed by evdev
//!
//! Each opened device gets a reader task; all of them feed one channel, so
//! keys from a keyboard and buttons from a mouse combine into a single
//! stream. Raw events are translated into [`Event`]s with pointer buttons
//! numbered the way X11 numbers them.
//!
//! When a device stops delivering events, releases for whatever it still
//! held are sent in its place.

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;

use anyhow::{Context, Result};
use evdev::{Device, EventType, InputEvent, Key, RelativeAxisType};
use tokio::sync::mpsc;

use crate::event::{Channel, Event};
use crate::press_state::PressState;

const CHANNEL_CAPACITY: usize = 256;

/// Merged, translated stream of events from every selected device.
pub struct InputSource {
    rx: mpsc::Receiver<InputEvent>,
    translator: Translator,
    pending: VecDeque<Event>,
}

impl InputSource {
    /// Start one reader task per device. Must be called inside a runtime.
    pub fn spawn(devices: Vec<(PathBuf, Device)>) -> Result<Self> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        for (path, device) in devices {
            let name = device.name().unwrap_or("Unknown").to_string();
            let mut stream = device
                .into_event_stream()
                .with_context(|| format!("Failed to watch {}", path.display()))?;
            tracing::info!("Reading events from {} ({})", name, path.display());

            let tx = tx.clone();
            tokio::spawn(async move {
                let mut held = HeldKeys::default();
                loop {
                    match stream.next_event().await {
                        Ok(event) => {
                            held.track(&event);
                            if tx.send(event).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Stopped reading {}: {}", path.display(), e);
                            break;
                        }
                    }
                }

                // Nothing held on a vanished device may stay pressed
                let releases = held.releases();
                if !releases.is_empty() {
                    tracing::warn!(
                        "Releasing {} input(s) held on {}",
                        releases.len(),
                        path.display()
                    );
                }
                for event in releases {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
            });
        }

        Ok(Self::from_receiver(rx))
    }

    pub(crate) fn from_receiver(rx: mpsc::Receiver<InputEvent>) -> Self {
        Self {
            rx,
            translator: Translator::default(),
            pending: VecDeque::new(),
        }
    }

    /// Next translated event, or `None` once every device has gone away.
    ///
    /// Cancel safe: an event is only removed from the queue when returned.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let raw = self.rx.recv().await?;
            self.pending.extend(self.translator.translate(&raw));
        }
    }
}

/// Raw key codes currently held on one device.
#[derive(Debug, Default)]
struct HeldKeys {
    codes: BTreeSet<u16>,
}

impl HeldKeys {
    fn track(&mut self, event: &InputEvent) {
        if event.event_type() != EventType::KEY {
            return;
        }
        match event.value() {
            0 => {
                self.codes.remove(&event.code());
            }
            1 => {
                self.codes.insert(event.code());
            }
            _ => {}
        }
    }

    /// Release events for everything still held, emptying the set.
    fn releases(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.codes)
            .into_iter()
            .map(|code| InputEvent::new(EventType::KEY, code, 0))
            .collect()
    }
}

/// Converts raw evdev events into press/release transitions.
///
/// Autorepeat is dropped, and so is any press of something already held or
/// release of something not held. Wheel motion becomes a click of buttons
/// 4/5 (vertical) or 6/7 (horizontal).
#[derive(Debug, Default)]
pub struct Translator {
    pressed: PressState,
}

impl Translator {
    pub fn translate(&mut self, event: &InputEvent) -> Vec<Event> {
        match event.event_type() {
            EventType::KEY => {
                let pressed = match event.value() {
                    0 => false,
                    1 => true,
                    // 2 is autorepeat
                    _ => return Vec::new(),
                };
                match map_key(event.code()) {
                    Some((channel, code)) => {
                        self.transition(channel, code, pressed).into_iter().collect()
                    }
                    None => {
                        tracing::trace!("Ignoring key code {}", event.code());
                        Vec::new()
                    }
                }
            }
            EventType::RELATIVE => match wheel_button(event.code(), event.value()) {
                Some(button) => [true, false]
                    .into_iter()
                    .filter_map(|pressed| self.transition(Channel::Button, button, pressed))
                    .collect(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn transition(&mut self, channel: Channel, code: u8, pressed: bool) -> Option<Event> {
        if self.pressed.get(channel, code) == pressed {
            return None;
        }
        self.pressed.set(channel, code, pressed);
        Some(Event {
            channel,
            code: code.into(),
            pressed,
        })
    }
}

/// Keyboard codes map to themselves; pointer buttons to X11 button numbers.
fn map_key(code: u16) -> Option<(Channel, u8)> {
    if let Ok(code) = u8::try_from(code) {
        return Some((Channel::Key, code));
    }

    let button = match Key::new(code) {
        Key::BTN_LEFT => 1,
        Key::BTN_MIDDLE => 2,
        Key::BTN_RIGHT => 3,
        Key::BTN_SIDE => 8,
        Key::BTN_EXTRA => 9,
        Key::BTN_FORWARD => 10,
        Key::BTN_BACK => 11,
        Key::BTN_TASK => 12,
        _ => return None,
    };
    Some((Channel::Button, button))
}

fn wheel_button(axis: u16, value: i32) -> Option<u8> {
    let (positive, negative) = if axis == RelativeAxisType::REL_WHEEL.0 {
        (4, 5)
    } else if axis == RelativeAxisType::REL_HWHEEL.0 {
        (7, 6)
    } else {
        return None;
    };

    match value {
        v if v > 0 => Some(positive),
        v if v < 0 => Some(negative),
        _ => None,
    }
}
