//! Hotkey matching and process lifecycle
//!
//! # State Machine
//!
//! Every combination is evaluated independently:
//!
//! ```text
//!            all required inputs held
//!            (spawn command)
//!  ┌──────┐ ─────────────────────────► ┌────────┐
//!  │ IDLE │                            │ ACTIVE │
//!  └──────┘ ◄───────────────────────── └────────┘
//!            any required input released
//!            (SIGTERM the child, if still running)
//! ```
//!
//! A combination is active exactly when its held set equals its required
//! set. Inputs outside the required set are ignored, so holding extra keys
//! neither blocks nor breaks a combination.
//!
//! The child handle of a combination is cleared by [`Engine::reap`]:
//! a deactivation signals the child but keeps the handle until the exit has
//! been collected. Re-activating while the previous child is still alive is
//! reported and spawns a second child anyway; if that spawn fails the slot
//! is left without a child.

use thiserror::Error;

use crate::event::{Channel, Event};
use crate::press_state::PressState;
use crate::process::{Launcher, ProcessHandle};
use crate::registry::{Combination, Registry};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EngineError {
    #[error("unexpected {channel} code {code} (input codes must be 0-255)")]
    CodeOutOfRange { channel: Channel, code: u16 },
}

/// Runtime state of one combination.
#[derive(Debug, Default)]
pub struct Slot {
    /// Required inputs currently held
    held: PressState,
    activated: bool,
    child: Option<ProcessHandle>,
}

impl Slot {
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn child(&self) -> Option<&ProcessHandle> {
        self.child.as_ref()
    }
}

/// Matches input events against the registry and supervises the commands.
pub struct Engine<L: Launcher> {
    combinations: Vec<(Combination, Slot)>,
    pressed: PressState,
    launcher: L,
}

/// Reject codes outside the bitmap range.
pub fn checked_code(event: &Event) -> Result<u8, EngineError> {
    u8::try_from(event.code).map_err(|_| EngineError::CodeOutOfRange {
        channel: event.channel,
        code: event.code,
    })
}

impl<L: Launcher> Engine<L> {
    pub fn new(registry: Registry, launcher: L) -> Self {
        let combinations = registry
            .iter()
            .cloned()
            .map(|combination| (combination, Slot::default()))
            .collect();

        Self {
            combinations,
            pressed: PressState::new(),
            launcher,
        }
    }

    /// Everything currently held, on every channel.
    pub fn pressed(&self) -> &PressState {
        &self.pressed
    }

    pub fn slots(&self) -> impl Iterator<Item = (&Combination, &Slot)> {
        self.combinations.iter().map(|(c, s)| (c, s))
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Collect exited children and free the slots that owned them.
    ///
    /// Non-blocking; a no-op when nothing has exited.
    pub fn reap(&mut self) {
        for exited in self.launcher.try_reap() {
            tracing::debug!("Reaped child process {} ({:?})", exited.pid, exited.status);

            let owner = self
                .combinations
                .iter_mut()
                .find(|(_, slot)| slot.child.as_ref().map(ProcessHandle::pid) == Some(exited.pid));

            if let Some((_, slot)) = owner {
                slot.child = None;
            }
        }
    }

    /// Process one event: reap, validate, update the press state and run
    /// the transitions of every combination that requires this input.
    ///
    /// Out-of-range codes are a broken input source and abort processing.
    /// Spawn and signal failures are logged and absorbed.
    pub fn handle_event(&mut self, event: Event) -> Result<(), EngineError> {
        self.reap();

        let code = checked_code(&event)?;
        self.pressed.set(event.channel, code, event.pressed);

        for (combination, slot) in &mut self.combinations {
            if !combination.required.get(event.channel, code) {
                continue;
            }

            slot.held.set(event.channel, code, event.pressed);
            let matched = slot.held == combination.required;

            if !slot.activated && matched {
                activate(&mut self.launcher, combination, slot);
            } else if slot.activated && !matched {
                deactivate(&mut self.launcher, combination, slot);
            }

            slot.activated = matched;
        }

        Ok(())
    }

    /// Send SIGTERM to the child of every active combination.
    ///
    /// Children of released combinations were signalled on release and are
    /// left alone. Used on daemon shutdown; does not wait for the children.
    pub fn terminate_all(&mut self) {
        for (combination, slot) in &self.combinations {
            if !slot.activated {
                continue;
            }
            if let Some(child) = &slot.child {
                tracing::debug!(
                    "Stopping '{}' (pid {}) for shutdown",
                    combination.command,
                    child.pid()
                );
                if let Err(e) = self.launcher.terminate(child) {
                    tracing::debug!("Could not signal process {}: {}", child.pid(), e);
                }
            }
        }
    }
}

/// Spawn the command of a newly matched combination.
///
/// Returns `true` when the previous child was still running. On spawn
/// failure the slot is left without a child; a replaced child stays tracked
/// by the launcher until it is reaped.
fn activate<L: Launcher>(launcher: &mut L, combination: &Combination, slot: &mut Slot) -> bool {
    let still_running = match &slot.child {
        Some(previous) => {
            tracing::warn!(
                "program '{}' is still running with pid {}",
                combination.command,
                previous.pid()
            );
            true
        }
        None => false,
    };

    tracing::debug!("{}: spawning '{}'", combination.name, combination.command);
    match launcher.spawn(&combination.command) {
        Ok(child) => slot.child = Some(child),
        Err(e) => {
            slot.child = None;
            tracing::warn!(
                "{}: failed to spawn '{}': {}",
                combination.name,
                combination.command,
                e
            );
        }
    }

    still_running
}

fn deactivate<L: Launcher>(launcher: &mut L, combination: &Combination, slot: &Slot) {
    let Some(child) = &slot.child else {
        return;
    };

    tracing::debug!(
        "{}: sending SIGTERM to process {}",
        combination.name,
        child.pid()
    );
    if let Err(e) = launcher.terminate(child) {
        // The child may have exited without being reaped yet
        tracing::debug!("Could not signal process {}: {}", child.pid(), e);
    }
}
