//! Main event loop
//!
//! Single-threaded: input events, child exits and shutdown requests are all
//! handled on one task, so the engine needs no locking.

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};

use crate::engine::Engine;
use crate::input::InputSource;
use crate::process::Launcher;

/// Feed events to the engine until SIGINT/SIGTERM or until every input
/// device is gone. Running commands are sent SIGTERM on the way out.
pub async fn run<L: Launcher>(engine: &mut Engine<L>, source: &mut InputSource) -> Result<()> {
    let mut sigchld = signal(SignalKind::child()).context("Failed to listen for SIGCHLD")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to listen for SIGINT")?;
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;

    tracing::info!("holdkeys daemon started");

    let result = loop {
        tokio::select! {
            event = source.next_event() => {
                let Some(event) = event else {
                    break Err(anyhow::anyhow!("All input devices were closed"));
                };
                if let Err(e) = engine.handle_event(event) {
                    break Err(e.into());
                }
                tracing::trace!("Held: {:?}", engine.pressed());
            }
            _ = sigchld.recv() => engine.reap(),
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, shutting down");
                break Ok(());
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down");
                break Ok(());
            }
        }
    };

    let running = engine
        .slots()
        .filter(|(_, slot)| slot.is_activated() && slot.child().is_some())
        .count();
    if running > 0 {
        tracing::info!("Stopping {} running command(s)", running);
    }
    engine.terminate_all();

    result
}

#[cfg(test)]
mod tests {
    use evdev::{EventType, InputEvent, Key};
    use holdkeys_config::parse_hotkey_spec;
    use tokio::sync::mpsc;

    use super::*;
    use crate::process::fake::FakeLauncher;
    use crate::registry::Registry;

    fn key(key: Key, value: i32) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), value)
    }

    fn engine(spec: &str) -> Engine<FakeLauncher> {
        let hotkey = parse_hotkey_spec(spec).unwrap();
        let registry = Registry::from_hotkeys([&hotkey]).unwrap();
        Engine::new(registry, FakeLauncher::default())
    }

    #[tokio::test]
    async fn test_events_drive_the_engine() {
        let mut engine = engine("LeftMeta+Button1=notify-send hi");
        let (tx, rx) = mpsc::channel(16);
        let mut source = InputSource::from_receiver(rx);

        tx.send(key(Key::KEY_LEFTMETA, 1)).await.unwrap();
        tx.send(key(Key::BTN_LEFT, 1)).await.unwrap();
        tx.send(key(Key::BTN_LEFT, 0)).await.unwrap();
        drop(tx);

        let result = run(&mut engine, &mut source).await;
        assert!(result.is_err(), "closed input must end the loop with an error");

        let launcher = engine.launcher();
        assert_eq!(launcher.spawned.len(), 1);
        assert_eq!(launcher.spawned[0].1, "notify-send hi");
        assert_eq!(launcher.terminated, vec![launcher.spawned[0].0]);
    }

    #[tokio::test]
    async fn test_shutdown_stops_running_commands() {
        let mut engine = engine("a=sleep 60");
        let (tx, rx) = mpsc::channel(16);
        let mut source = InputSource::from_receiver(rx);

        tx.send(key(Key::KEY_A, 1)).await.unwrap();
        drop(tx);

        run(&mut engine, &mut source).await.unwrap_err();

        let launcher = engine.launcher();
        assert_eq!(launcher.spawned.len(), 1);
        assert_eq!(launcher.terminated, vec![launcher.spawned[0].0]);
    }
}
