//! Combination registry
//!
//! Resolves declared hotkeys into the set of `(channel, code)` pairs that must
//! be held together. Built once at startup and never mutated afterwards.

use holdkeys_config::keys::{resolve_button, resolve_key};
use holdkeys_config::HotkeyConfig;
use thiserror::Error;

use crate::event::Channel;
use crate::press_state::PressState;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{hotkey}: key '{key}' could not be recognized")]
    UnknownKey { hotkey: String, key: String },

    #[error("{hotkey}: button '{button}' could not be recognized")]
    UnknownButton { hotkey: String, button: String },

    #[error("{hotkey}: at least one key or button is required")]
    EmptyChord { hotkey: String },

    #[error("{hotkey}: an on-press command is required")]
    MissingCommand { hotkey: String },
}

/// A resolved hotkey.
#[derive(Debug, Clone)]
pub struct Combination {
    pub name: String,
    pub required: PressState,
    pub command: String,
}

impl Combination {
    /// Resolve a declared hotkey. `index` is its declaration position, used
    /// to label unnamed hotkeys.
    pub fn resolve(config: &HotkeyConfig, index: usize) -> Result<Self, RegistryError> {
        let name = config.label(index);
        let mut required = PressState::new();

        for key in &config.keys {
            let code = resolve_key(key).ok_or_else(|| RegistryError::UnknownKey {
                hotkey: name.clone(),
                key: key.clone(),
            })?;
            required.set(Channel::Key, code, true);
        }

        for button in &config.buttons {
            let number = resolve_button(button).ok_or_else(|| RegistryError::UnknownButton {
                hotkey: name.clone(),
                button: button.clone(),
            })?;
            required.set(Channel::Button, number, true);
        }

        if required.is_empty() {
            return Err(RegistryError::EmptyChord { hotkey: name });
        }

        if config.on_press.trim().is_empty() {
            return Err(RegistryError::MissingCommand { hotkey: name });
        }

        Ok(Self {
            name,
            required,
            command: config.on_press.clone(),
        })
    }
}

/// Immutable list of combinations, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    combinations: Vec<Combination>,
}

impl Registry {
    pub fn from_hotkeys<'a, I>(hotkeys: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = &'a HotkeyConfig>,
    {
        let combinations = hotkeys
            .into_iter()
            .enumerate()
            .map(|(index, hotkey)| Combination::resolve(hotkey, index))
            .collect::<Result<Vec<_>, _>>()?;

        for combination in &combinations {
            tracing::debug!(
                "Registered {}: {:?} -> {}",
                combination.name,
                combination.required,
                combination.command
            );
        }

        Ok(Self { combinations })
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Combination> {
        self.combinations.iter()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Combination;
    type IntoIter = std::slice::Iter<'a, Combination>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotkey(keys: &[&str], buttons: &[&str], on_press: &str) -> HotkeyConfig {
        HotkeyConfig {
            name: None,
            keys: keys.iter().map(|s| s.to_string()).collect(),
            buttons: buttons.iter().map(|s| s.to_string()).collect(),
            on_press: on_press.to_string(),
        }
    }

    #[test]
    fn test_resolves_keys_and_buttons() {
        let a = resolve_key("a").unwrap();
        let registry = Registry::from_hotkeys(&[hotkey(&["a"], &["1", "right"], "true")]).unwrap();

        assert_eq!(registry.len(), 1);
        let combination = registry.iter().next().unwrap();
        assert_eq!(combination.name, "hotkey #1");
        assert_eq!(combination.command, "true");

        let pairs: Vec<_> = combination.required.iter().collect();
        assert_eq!(
            pairs,
            vec![(Channel::Key, a), (Channel::Button, 1), (Channel::Button, 3)]
        );
    }

    #[test]
    fn test_named_hotkey_keeps_name() {
        let mut config = hotkey(&["F1"], &[], "true");
        config.name = Some("help".to_string());

        let registry = Registry::from_hotkeys(&[config]).unwrap();
        assert_eq!(registry.iter().next().unwrap().name, "help");
    }

    #[test]
    fn test_unknown_key_is_fatal() {
        let result = Registry::from_hotkeys(&[
            hotkey(&["a"], &[], "true"),
            hotkey(&["Nope"], &[], "true"),
        ]);

        assert_eq!(
            result.unwrap_err(),
            RegistryError::UnknownKey {
                hotkey: "hotkey #2".to_string(),
                key: "Nope".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_button_is_fatal() {
        let result = Registry::from_hotkeys(&[hotkey(&[], &["0"], "true")]);
        assert!(matches!(result, Err(RegistryError::UnknownButton { .. })));
    }

    #[test]
    fn test_button_only_hotkey_is_allowed() {
        let registry = Registry::from_hotkeys(&[hotkey(&[], &["2"], "true")]).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_chord_is_fatal() {
        let result = Registry::from_hotkeys(&[hotkey(&[], &[], "true")]);
        assert!(matches!(result, Err(RegistryError::EmptyChord { .. })));
    }

    #[test]
    fn test_missing_command_is_fatal() {
        let result = Registry::from_hotkeys(&[hotkey(&["a"], &[], "  ")]);
        assert!(matches!(result, Err(RegistryError::MissingCommand { .. })));
    }

    #[test]
    fn test_error_message_names_hotkey() {
        let err = Registry::from_hotkeys(&[hotkey(&["Nope"], &[], "true")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "hotkey #1: key 'Nope' could not be recognized"
        );
    }
}
