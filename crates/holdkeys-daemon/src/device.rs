//! Input device discovery and selection

use std::io;
use std::path::{Path, PathBuf};

use evdev::{Device, EventType, Key};
use thiserror::Error;

const INPUT_DIR: &str = "/dev/input";

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("unable to find device '{0}'")]
    NotFound(String),

    #[error("more than one device found with the name '{0}'")]
    Ambiguous(String),

    #[error("no keyboard or pointer device could be opened (is the user in the 'input' group?)")]
    NoDevices,

    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list /dev/input: {0}")]
    Io(#[from] io::Error),
}

/// Paths of every `eventN` node, in ascending event number order.
fn event_nodes() -> Result<Vec<PathBuf>, DeviceError> {
    let mut nodes: Vec<(u32, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(INPUT_DIR)? {
        let path = entry?.path();
        if let Some(number) = event_number(&path) {
            nodes.push((number, path));
        }
    }

    nodes.sort_by_key(|(number, _)| *number);
    Ok(nodes.into_iter().map(|(_, path)| path).collect())
}

fn event_number(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("event")?
        .parse()
        .ok()
}

/// Open every readable event node. Nodes we lack permission for are skipped.
fn open_all() -> Result<Vec<(PathBuf, Device)>, DeviceError> {
    let mut devices = Vec::new();

    for path in event_nodes()? {
        match Device::open(&path) {
            Ok(device) => devices.push((path, device)),
            Err(e) => tracing::debug!("Could not open {}: {}", path.display(), e),
        }
    }

    Ok(devices)
}

/// Whether a device can produce anything a hotkey can use: letter keys or a
/// primary pointer button.
pub fn is_hotkey_source(device: &Device) -> bool {
    device.supported_events().contains(EventType::KEY)
        && device
            .supported_keys()
            .map(|keys| keys.contains(Key::KEY_A) || keys.contains(Key::BTN_LEFT))
            .unwrap_or(false)
}

/// Path named directly by a selector: an absolute path or a bare event number.
fn selector_path(selector: &str) -> Option<PathBuf> {
    if selector.starts_with('/') {
        Some(PathBuf::from(selector))
    } else {
        selector
            .parse::<u32>()
            .ok()
            .map(|n| Path::new(INPUT_DIR).join(format!("event{}", n)))
    }
}

/// Find the single device called `name`.
fn match_by_name(names: &[&str], name: &str) -> Result<usize, DeviceError> {
    let mut matches = names
        .iter()
        .enumerate()
        .filter(|(_, candidate)| **candidate == name)
        .map(|(index, _)| index);

    match (matches.next(), matches.next()) {
        (Some(index), None) => Ok(index),
        (Some(_), Some(_)) => Err(DeviceError::Ambiguous(name.to_string())),
        (None, _) => Err(DeviceError::NotFound(name.to_string())),
    }
}

/// Open the devices to read events from.
///
/// With a selector, exactly one device is opened: the selector is a device
/// path, an event number, or an exact device name. Without one, every device
/// that has letter keys or a left button is used, so keyboard and mouse feed
/// the same hotkeys.
pub fn open_devices(selector: Option<&str>) -> Result<Vec<(PathBuf, Device)>, DeviceError> {
    match selector {
        Some(selector) => {
            if let Some(path) = selector_path(selector) {
                if !path.exists() {
                    return Err(DeviceError::NotFound(selector.to_string()));
                }
                let device = Device::open(&path).map_err(|source| DeviceError::Open {
                    path: path.clone(),
                    source,
                })?;
                return Ok(vec![(path, device)]);
            }

            let mut devices = open_all()?;
            let names: Vec<&str> = devices
                .iter()
                .map(|(_, device)| device.name().unwrap_or_default())
                .collect();
            let index = match_by_name(&names, selector)?;
            Ok(vec![devices.swap_remove(index)])
        }
        None => {
            let devices: Vec<_> = open_all()?
                .into_iter()
                .filter(|(path, device)| {
                    let usable = is_hotkey_source(device);
                    if !usable {
                        tracing::trace!("Skipping {}", path.display());
                    }
                    usable
                })
                .collect();

            if devices.is_empty() {
                return Err(DeviceError::NoDevices);
            }
            Ok(devices)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_path() {
        assert_eq!(
            selector_path("/dev/input/event3"),
            Some(PathBuf::from("/dev/input/event3"))
        );
        assert_eq!(
            selector_path("7"),
            Some(PathBuf::from("/dev/input/event7"))
        );
        assert_eq!(selector_path("AT Translated Set 2 keyboard"), None);
    }

    #[test]
    fn test_event_number() {
        assert_eq!(event_number(Path::new("/dev/input/event12")), Some(12));
        assert_eq!(event_number(Path::new("/dev/input/mouse0")), None);
        assert_eq!(event_number(Path::new("/dev/input/by-id")), None);
    }

    #[test]
    fn test_match_by_name() {
        let devices = ["Power Button", "Keychron K3", "Logitech Mouse"];

        assert_eq!(match_by_name(&devices, "Keychron K3").unwrap(), 1);
        assert!(matches!(
            match_by_name(&devices, "keychron k3"),
            Err(DeviceError::NotFound(_))
        ));
    }

    #[test]
    fn test_ambiguous_name_is_an_error() {
        let devices = ["Keychron K3", "Keychron K3"];

        let err = match_by_name(&devices, "Keychron K3").unwrap_err();
        assert_eq!(
            err.to_string(),
            "more than one device found with the name 'Keychron K3'"
        );
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let result = open_devices(Some("/nonexistent/event0"));
        assert!(matches!(result, Err(DeviceError::NotFound(_))));
    }
}
