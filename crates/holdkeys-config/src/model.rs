//! Configuration data model

/// Root configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub hotkeys: Vec<HotkeyConfig>,
}

/// Global settings
#[derive(Debug, Clone, Default)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
    /// Input device to read from (name, `/dev/input/eventN` path or event number).
    /// `None` reads every keyboard and pointer device.
    pub device: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// A declared hotkey, before symbol resolution.
///
/// Keys and buttons are kept as the user wrote them; the daemon resolves them
/// to device codes when it builds its registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeyConfig {
    /// Optional label used in log messages
    pub name: Option<String>,
    /// Key names (e.g. "LeftMeta", "a", "KEY_F13")
    pub keys: Vec<String>,
    /// Button numbers or aliases (e.g. "1", "left")
    pub buttons: Vec<String>,
    /// Command run through `/bin/sh -c` while the chord is held
    pub on_press: String,
}

impl HotkeyConfig {
    /// Label for log messages: the configured name, or `hotkey #<n>` where
    /// `n` is the 1-based declaration index.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("hotkey #{}", index + 1),
        }
    }
}
