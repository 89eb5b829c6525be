use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(holdkeys::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(holdkeys::config::invalid))]
    Invalid { message: String },

    #[error("Unknown key: {key}")]
    #[diagnostic(
        code(holdkeys::config::unknown_key),
        help("run `holdkeysd --monitor` and press the key to see its name")
    )]
    UnknownKey {
        key: String,
        #[source_code]
        src: String,
        #[label("not a key name")]
        span: miette::SourceSpan,
    },

    #[error("Unknown button: {button}")]
    #[diagnostic(
        code(holdkeys::config::unknown_button),
        help("buttons are numbers from 1 to 255, or left/middle/right")
    )]
    UnknownButton {
        button: String,
        #[source_code]
        src: String,
        #[label("not a button")]
        span: miette::SourceSpan,
    },

    #[error("Hotkey {hotkey} has neither keys nor buttons")]
    #[diagnostic(code(holdkeys::config::empty_chord))]
    EmptyChord {
        hotkey: String,
        #[source_code]
        src: String,
        #[label("declared here")]
        span: miette::SourceSpan,
    },

    #[error("Hotkey {hotkey} has no on-press command")]
    #[diagnostic(code(holdkeys::config::missing_command))]
    MissingCommand {
        hotkey: String,
        #[source_code]
        src: String,
        #[label("declared here")]
        span: miette::SourceSpan,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
