//! holdkeys CLI
//!
//! Configuration checking and discovery helpers for holdkeys.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use holdkeys_config::keys::{button_name, key_name, resolve_button};
use holdkeys_config::{Config, HotkeyConfig};
use miette::IntoDiagnostic;

#[derive(Parser, Debug)]
#[command(name = "holdkeys")]
#[command(about = "Configuration tool for the holdkeys daemon")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/holdkeys/config.kdl")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file and inline hotkeys
    Validate {
        /// Inline hotkey to check, in the daemon's --hotkey syntax
        #[arg(short = 'k', long = "hotkey", value_name = "CHORD=COMMAND")]
        hotkeys: Vec<String>,
    },

    /// List available input devices
    Devices,

    /// List key names usable in hotkeys
    Keys {
        /// Only show names containing this text
        filter: Option<String>,
    },
}

fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    match cli.command {
        Commands::Validate { hotkeys } => cmd_validate(&config_path, &hotkeys),
        Commands::Devices => cmd_devices(),
        Commands::Keys { filter } => cmd_keys(filter.as_deref()),
    }
}

fn cmd_validate(config_path: &Path, specs: &[String]) -> miette::Result<()> {
    let mut config = Config::default();

    // Inline hotkeys can be checked on their own
    if specs.is_empty() || config_path.exists() {
        println!("Validating configuration: {}", config_path.display());
        config = holdkeys_config::parse_config(config_path).map_err(miette::Report::new)?;
    }

    for spec in specs {
        let hotkey = holdkeys_config::parse_hotkey_spec(spec).map_err(miette::Report::new)?;
        config.hotkeys.push(hotkey);
    }

    println!("Configuration is valid!");
    println!("  Log level: {}", config.global.log_level.as_directive());
    println!(
        "  Device: {}",
        config.global.device.as_deref().unwrap_or("<all keyboards and mice>")
    );
    println!("  Hotkeys: {}", config.hotkeys.len());
    for (index, hotkey) in config.hotkeys.iter().enumerate() {
        println!(
            "    - {}: {} -> {}",
            hotkey.label(index),
            chord(hotkey),
            hotkey.on_press
        );
    }

    Ok(())
}

/// A hotkey's chord in the inline `+`-joined form.
fn chord(hotkey: &HotkeyConfig) -> String {
    hotkey
        .keys
        .iter()
        .cloned()
        .chain(
            hotkey
                .buttons
                .iter()
                .filter_map(|b| resolve_button(b))
                .map(button_name),
        )
        .collect::<Vec<_>>()
        .join("+")
}

fn cmd_devices() -> miette::Result<()> {
    println!("Available input devices:\n");

    let mut paths: Vec<PathBuf> = std::fs::read_dir("/dev/input")
        .into_diagnostic()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("event"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort_by_key(|path| event_number(path));

    let mut unreadable = 0;
    for path in paths {
        match evdev::Device::open(&path) {
            Ok(device) => {
                let name = device.name().unwrap_or("Unknown");
                let id = device.input_id();
                let vendor_product = format!("{:04x}:{:04x}", id.vendor(), id.product());

                let keys = device.supported_keys();
                let has = |key: evdev::Key| keys.map(|keys| keys.contains(key)).unwrap_or(false);
                let device_type = match (has(evdev::Key::KEY_A), has(evdev::Key::BTN_LEFT)) {
                    (true, true) => "keyboard, pointer",
                    (true, false) => "keyboard",
                    (false, true) => "pointer",
                    (false, false) => "other",
                };

                println!("  {} [{}]", name, device_type);
                println!("    Path: {}", path.display());
                println!("    ID: {}", vendor_product);
                println!();
            }
            Err(e) => {
                tracing::debug!("Could not open {}: {}", path.display(), e);
                unreadable += 1;
            }
        }
    }

    if unreadable > 0 {
        println!(
            "{} device(s) could not be opened; add your user to the 'input' group to see them.",
            unreadable
        );
    }

    Ok(())
}

fn event_number(path: &Path) -> u32 {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("event"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX)
}

fn cmd_keys(filter: Option<&str>) -> miette::Result<()> {
    let filter = filter.map(str::to_uppercase);

    for name in named_keys() {
        if filter.as_deref().map_or(true, |f| name.contains(f)) {
            println!("{}", name);
        }
    }

    println!();
    println!("Keys can also be given as raw codes (#0-#255), buttons as Button1-Button255.");
    Ok(())
}

/// Names of every key code a hotkey can refer to, in code order.
fn named_keys() -> Vec<String> {
    (0..=u8::MAX)
        .map(key_name)
        .filter(|name| name.starts_with("KEY_"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_joins_keys_and_buttons() {
        let hotkey = holdkeys_config::parse_hotkey_spec("LeftMeta+a+Button3=run").unwrap();
        assert_eq!(chord(&hotkey), "LeftMeta+a+Button3");
    }

    #[test]
    fn test_chord_names_button_aliases_by_number() {
        let config = holdkeys_config::parse_config_str(
            r#"hotkey { key "a"; button "left" 9; on-press "run"; }"#,
        )
        .unwrap();
        assert_eq!(chord(&config.hotkeys[0]), "a+Button1+Button9");
    }

    #[test]
    fn test_named_keys() {
        let names = named_keys();
        assert!(names.contains(&"KEY_A".to_string()));
        assert!(names.contains(&"KEY_LEFTMETA".to_string()));
        assert!(names.iter().all(|n| !n.starts_with('#')));
    }

    #[test]
    fn test_event_number_orders_devices() {
        assert_eq!(event_number(Path::new("/dev/input/event10")), 10);
        assert_eq!(event_number(Path::new("/dev/input/event2")), 2);
    }
}
