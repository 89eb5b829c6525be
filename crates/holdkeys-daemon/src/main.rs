//! holdkeys daemon
//!
//! Runs a command while a key/button combination is held down and stops it
//! when the combination is released.

mod daemon;
mod device;
mod engine;
mod event;
mod input;
mod logging;
mod monitor;
mod press_state;
mod process;
mod registry;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use holdkeys_config::{Config, HotkeyConfig};

use crate::engine::Engine;
use crate::input::InputSource;
use crate::process::ShellLauncher;
use crate::registry::Registry;

const DEFAULT_CONFIG_PATH: &str = "~/.config/holdkeys/config.kdl";

#[derive(Parser, Debug)]
#[command(name = "holdkeysd")]
#[command(about = "Run commands while key combinations are held")]
#[command(version)]
struct Args {
    /// Path to configuration file [default: ~/.config/holdkeys/config.kdl]
    #[arg(short, long)]
    config: Option<String>,

    /// Read from one device only: a name, a /dev/input/eventN path or an event number
    #[arg(short, long)]
    device: Option<String>,

    /// Hotkey as keys and ButtonN joined by '+', then '=' and the command
    #[arg(short = 'k', long = "hotkey", value_name = "CHORD=COMMAND")]
    hotkeys: Vec<String>,

    /// Print input events instead of running hotkeys
    #[arg(short, long)]
    monitor: bool,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let logging = logging::init(args.verbose);

    let config = load_config(args.config.as_deref())?;
    logging.apply_config_level(config.global.log_level);

    let selector = args.device.as_deref().or(config.global.device.as_deref());

    if args.monitor {
        let mut source = open_source(selector)?;
        return monitor::run(&mut source).await;
    }

    let hotkeys = collect_hotkeys(config.hotkeys, &args.hotkeys)?;
    let registry = Registry::from_hotkeys(&hotkeys)?;
    tracing::info!("Loaded {} hotkey(s)", registry.len());

    let mut source = open_source(selector)?;
    let mut engine = Engine::new(registry, ShellLauncher::new());
    let result = daemon::run(&mut engine, &mut source).await;

    engine.reap();
    let outstanding = engine.launcher().outstanding();
    if outstanding > 0 {
        tracing::debug!("{} child process(es) not yet reaped at exit", outstanding);
    }

    result
}

/// Load the config file. A missing default file means an empty config; a
/// missing explicit one is an error.
fn load_config(path: Option<&str>) -> Result<Config> {
    let explicit = path.is_some();
    let path: PathBuf = shellexpand::tilde(path.unwrap_or(DEFAULT_CONFIG_PATH))
        .into_owned()
        .into();

    if !explicit && !path.exists() {
        tracing::debug!("No configuration at {}", path.display());
        return Ok(Config::default());
    }

    read_config(&path)
}

fn read_config(path: &Path) -> Result<Config> {
    tracing::info!("Loading configuration from {}", path.display());

    holdkeys_config::parse_config(path).with_context(|| {
        format!(
            "Invalid configuration in {} (run `holdkeys validate` for details)",
            path.display()
        )
    })
}

/// Config file hotkeys first, then `--hotkey` ones, in the order given.
fn collect_hotkeys(mut hotkeys: Vec<HotkeyConfig>, specs: &[String]) -> Result<Vec<HotkeyConfig>> {
    for spec in specs {
        let hotkey = holdkeys_config::parse_hotkey_spec(spec)
            .with_context(|| format!("Invalid --hotkey '{}'", spec))?;
        hotkeys.push(hotkey);
    }

    if hotkeys.is_empty() {
        bail!("No hotkeys configured: pass --hotkey or add hotkey nodes to the config file");
    }

    Ok(hotkeys)
}

fn open_source(selector: Option<&str>) -> Result<InputSource> {
    let devices = device::open_devices(selector)?;
    InputSource::spawn(devices)
}
