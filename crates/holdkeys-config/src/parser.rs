//! KDL configuration parser and inline hotkey parser

use std::path::Path;

use crate::error::ConfigError;
use crate::keys::{resolve_button, resolve_key, strip_button_prefix};
use crate::model::*;

fn to_span(offset: usize, len: usize) -> miette::SourceSpan {
    miette::SourceSpan::from((offset, len))
}

/// Span of a KDL node's name
fn node_span(node: &kdl::KdlNode) -> miette::SourceSpan {
    let span = node.name().span();
    to_span(span.offset(), span.len())
}

/// Span of a KDL entry (argument or property)
fn entry_span(entry: &kdl::KdlEntry) -> miette::SourceSpan {
    let span = entry.span();
    to_span(span.offset(), span.len())
}

/// Positional (unnamed) arguments of a node
fn arguments(node: &kdl::KdlNode) -> impl Iterator<Item = &kdl::KdlEntry> {
    node.entries().iter().filter(|e| e.name().is_none())
}

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl reports spans with its own miette version
        let span = to_span(e.span.offset(), e.span.len());
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "hotkey" => {
                let index = config.hotkeys.len();
                config.hotkeys.push(parse_hotkey(node, index, content)?);
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let value = arguments(child).next().map(|e| e.value());
            match child.name().value() {
                "log-level" => {
                    if let Some(val) = value.and_then(|v| v.as_string()) {
                        global.log_level =
                            val.parse().map_err(|e| ConfigError::Invalid { message: e })?;
                    }
                }
                "device" => {
                    // `device 4` is shorthand for /dev/input/event4
                    global.device = match value {
                        Some(v) if v.as_string().is_some() => v.as_string().map(str::to_string),
                        Some(v) if v.as_i64().is_some() => v.as_i64().map(|n| n.to_string()),
                        _ => {
                            return Err(ConfigError::Invalid {
                                message: "`device` expects a device name, path or number"
                                    .to_string(),
                            })
                        }
                    };
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

fn parse_hotkey(
    node: &kdl::KdlNode,
    index: usize,
    source: &str,
) -> Result<HotkeyConfig, ConfigError> {
    let name = arguments(node)
        .next()
        .and_then(|e| e.value().as_string())
        .map(str::to_string);

    let mut hotkey = HotkeyConfig {
        name,
        ..HotkeyConfig::default()
    };

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "key" => {
                    for entry in arguments(child) {
                        let key = entry.value().as_string().unwrap_or_default();
                        if resolve_key(key).is_none() {
                            return Err(ConfigError::UnknownKey {
                                key: entry.value().to_string(),
                                src: source.to_string(),
                                span: entry_span(entry),
                            });
                        }
                        hotkey.keys.push(key.to_string());
                    }
                }
                "button" => {
                    for entry in arguments(child) {
                        let button = match entry.value().as_i64() {
                            Some(n) => n.to_string(),
                            None => entry.value().as_string().unwrap_or_default().to_string(),
                        };
                        if resolve_button(&button).is_none() {
                            return Err(ConfigError::UnknownButton {
                                button: entry.value().to_string(),
                                src: source.to_string(),
                                span: entry_span(entry),
                            });
                        }
                        hotkey.buttons.push(button);
                    }
                }
                "on-press" => {
                    if let Some(cmd) = arguments(child).next().and_then(|e| e.value().as_string())
                    {
                        hotkey.on_press = cmd.to_string();
                    }
                }
                name => {
                    tracing::warn!("Unknown hotkey option: {}", name);
                }
            }
        }
    }

    if hotkey.keys.is_empty() && hotkey.buttons.is_empty() {
        return Err(ConfigError::EmptyChord {
            hotkey: hotkey.label(index),
            src: source.to_string(),
            span: node_span(node),
        });
    }

    if hotkey.on_press.trim().is_empty() {
        return Err(ConfigError::MissingCommand {
            hotkey: hotkey.label(index),
            src: source.to_string(),
            span: node_span(node),
        });
    }

    Ok(hotkey)
}

/// Parse an inline hotkey of the form `<chord>=<command>`.
///
/// The chord is a `+`-separated list of key names and `Button<N>` tokens;
/// everything after the first `=` is the command:
///
/// ```
/// let hotkey = holdkeys_config::parse_hotkey_spec("LeftMeta+Button1=notify-send held").unwrap();
/// assert_eq!(hotkey.keys, vec!["LeftMeta"]);
/// assert_eq!(hotkey.buttons, vec!["1"]);
/// assert_eq!(hotkey.on_press, "notify-send held");
/// ```
pub fn parse_hotkey_spec(spec: &str) -> Result<HotkeyConfig, ConfigError> {
    let label = format!("'{}'", spec);

    let Some((chord, command)) = spec.split_once('=') else {
        return Err(ConfigError::MissingCommand {
            hotkey: label,
            src: spec.to_string(),
            span: to_span(0, spec.len()),
        });
    };

    if command.trim().is_empty() {
        return Err(ConfigError::MissingCommand {
            hotkey: label,
            src: spec.to_string(),
            span: to_span(chord.len(), spec.len() - chord.len()),
        });
    }

    let mut hotkey = HotkeyConfig {
        on_press: command.to_string(),
        ..HotkeyConfig::default()
    };

    if chord.trim().is_empty() {
        return Err(ConfigError::EmptyChord {
            hotkey: label,
            src: spec.to_string(),
            span: to_span(0, chord.len()),
        });
    }

    let mut offset = 0;
    for part in chord.split('+') {
        let token = part.trim();
        let start = offset + (part.len() - part.trim_start().len());
        let span = to_span(start, token.len());
        offset += part.len() + 1;

        if token.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("empty key name in hotkey {}", label),
            });
        }

        if let Some(button) = strip_button_prefix(token) {
            if resolve_button(button).is_none() {
                return Err(ConfigError::UnknownButton {
                    button: token.to_string(),
                    src: spec.to_string(),
                    span,
                });
            }
            hotkey.buttons.push(button.to_string());
        } else {
            if resolve_key(token).is_none() {
                return Err(ConfigError::UnknownKey {
                    key: token.to_string(),
                    src: spec.to_string(),
                    span,
                });
            }
            hotkey.keys.push(token.to_string());
        }
    }

    Ok(hotkey)
}
