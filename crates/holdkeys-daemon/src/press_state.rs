//! Fixed-size press bitmaps
//!
//! A [`PressState`] is a set of `(channel, code)` pairs with `code` in
//! `0..=255`. It is used both for the global set of held inputs and for each
//! combination's required and held sets, so matching a combination is plain
//! equality of two bitmaps.

use std::fmt;

use crate::event::Channel;

const CODES: usize = 256;

#[derive(Clone, PartialEq, Eq)]
pub struct PressState {
    keys: [bool; CODES],
    buttons: [bool; CODES],
}

impl PressState {
    pub fn new() -> Self {
        Self {
            keys: [false; CODES],
            buttons: [false; CODES],
        }
    }

    fn map(&self, channel: Channel) -> &[bool; CODES] {
        match channel {
            Channel::Key => &self.keys,
            Channel::Button => &self.buttons,
        }
    }

    fn map_mut(&mut self, channel: Channel) -> &mut [bool; CODES] {
        match channel {
            Channel::Key => &mut self.keys,
            Channel::Button => &mut self.buttons,
        }
    }

    pub fn get(&self, channel: Channel, code: u8) -> bool {
        self.map(channel)[usize::from(code)]
    }

    pub fn set(&mut self, channel: Channel, code: u8, pressed: bool) {
        self.map_mut(channel)[usize::from(code)] = pressed;
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.keys.iter().chain(self.buttons.iter()).filter(|&&b| b).count()
    }

    /// Codes set on one channel, in ascending order.
    pub fn codes(&self, channel: Channel) -> impl Iterator<Item = u8> + '_ {
        self.map(channel)
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(code, _)| code as u8)
    }

    /// All set pairs, keys first.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, u8)> + '_ {
        self.codes(Channel::Key)
            .map(|code| (Channel::Key, code))
            .chain(self.codes(Channel::Button).map(|code| (Channel::Button, code)))
    }
}

impl Default for PressState {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<(Channel, u8)> for PressState {
    fn from_iter<I: IntoIterator<Item = (Channel, u8)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (channel, code) in iter {
            state.set(channel, code, true);
        }
        state
    }
}

impl fmt::Debug for PressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(|(channel, code)| format!("{}:{}", channel, code)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_separate() {
        let mut state = PressState::new();
        state.set(Channel::Key, 30, true);

        assert!(state.get(Channel::Key, 30));
        assert!(!state.get(Channel::Button, 30));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_full_code_range() {
        let mut state = PressState::new();
        state.set(Channel::Key, 0, true);
        state.set(Channel::Button, 255, true);

        assert!(state.get(Channel::Key, 0));
        assert!(state.get(Channel::Button, 255));

        state.set(Channel::Button, 255, false);
        assert!(!state.get(Channel::Button, 255));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_equality_is_exact() {
        let required: PressState = [(Channel::Key, 30), (Channel::Button, 1)]
            .into_iter()
            .collect();

        let mut held = PressState::new();
        held.set(Channel::Key, 30, true);
        assert_ne!(held, required);

        held.set(Channel::Button, 1, true);
        assert_eq!(held, required);

        held.set(Channel::Key, 31, true);
        assert_ne!(held, required);
    }

    #[test]
    fn test_iter_orders_keys_before_buttons() {
        let state: PressState = [(Channel::Button, 3), (Channel::Key, 40), (Channel::Key, 2)]
            .into_iter()
            .collect();

        let pairs: Vec<_> = state.iter().collect();
        assert_eq!(
            pairs,
            vec![(Channel::Key, 2), (Channel::Key, 40), (Channel::Button, 3)]
        );
    }

    #[test]
    fn test_empty() {
        let state = PressState::default();
        assert!(state.is_empty());
        assert_eq!(format!("{:?}", state), "{}");
    }
}
