//! Event monitor
//!
//! Prints every press and release together with the chord currently held,
//! in the same `+`-joined form the `--hotkey` option accepts. Useful for
//! finding out what a key is called before writing a hotkey for it.

use anyhow::{Context, Result};
use holdkeys_config::keys::{button_name, key_name};

use crate::engine::{checked_code, EngineError};
use crate::event::{Channel, Event};
use crate::input::InputSource;
use crate::press_state::PressState;

#[derive(Debug, Default)]
pub struct Monitor {
    pressed: PressState,
}

impl Monitor {
    /// Record `event` and describe it, e.g.
    /// `KEY_LEFTMETA+KEY_A # pressed key KEY_A`.
    pub fn line(&mut self, event: &Event) -> Result<String, EngineError> {
        let code = checked_code(event)?;
        self.pressed.set(event.channel, code, event.pressed);

        let name = match event.channel {
            Channel::Key => key_name(code),
            Channel::Button => code.to_string(),
        };
        let action = if event.pressed { "pressed" } else { "released" };
        let chord = chord(&self.pressed);

        if chord.is_empty() {
            Ok(format!("# {} {} {}", action, event.channel, name))
        } else {
            Ok(format!("{} # {} {} {}", chord, action, event.channel, name))
        }
    }
}

/// Held inputs joined with `+`, keys first.
pub fn chord(state: &PressState) -> String {
    state
        .iter()
        .map(|(channel, code)| match channel {
            Channel::Key => key_name(code),
            Channel::Button => button_name(code),
        })
        .collect::<Vec<_>>()
        .join("+")
}

/// Print events until the input source closes.
pub async fn run(source: &mut InputSource) -> Result<()> {
    let mut monitor = Monitor::default();

    loop {
        let event = source
            .next_event()
            .await
            .context("All input devices were closed")?;
        println!("{}", monitor.line(&event)?);
    }
}

#[cfg(test)]
mod tests {
    use holdkeys_config::keys::resolve_key;

    use super::*;

    fn key(name: &str) -> u16 {
        u16::from(resolve_key(name).unwrap())
    }

    #[test]
    fn test_single_press_and_release() {
        let mut monitor = Monitor::default();

        assert_eq!(
            monitor.line(&Event::press(Channel::Key, key("a"))).unwrap(),
            "KEY_A # pressed key KEY_A"
        );
        assert_eq!(
            monitor.line(&Event::release(Channel::Key, key("a"))).unwrap(),
            "# released key KEY_A"
        );
    }

    #[test]
    fn test_chord_lists_keys_then_buttons() {
        let mut monitor = Monitor::default();
        monitor.line(&Event::press(Channel::Button, 1)).unwrap();
        monitor.line(&Event::press(Channel::Key, key("LeftMeta"))).unwrap();

        assert_eq!(
            monitor.line(&Event::press(Channel::Key, key("a"))).unwrap(),
            "KEY_A+KEY_LEFTMETA+Button1 # pressed key KEY_A"
        );
        assert_eq!(
            monitor.line(&Event::release(Channel::Button, 1)).unwrap(),
            "KEY_A+KEY_LEFTMETA # released button 1"
        );
    }

    #[test]
    fn test_out_of_range_code_is_an_error() {
        let mut monitor = Monitor::default();
        assert!(monitor.line(&Event::press(Channel::Key, 256)).is_err());
    }
}
