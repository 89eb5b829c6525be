//! Key and button symbol tables
//!
//! Hotkeys can only refer to codes in `0..=255`, one bitmap per channel.
//! Key names resolve to evdev key codes; buttons use X11 numbering
//! (1 = left, 2 = middle, 3 = right, 4-7 = scroll, 8+ = side buttons).

use std::str::FromStr;

use evdev::Key;

/// Highest code a hotkey can refer to, on either channel.
pub const MAX_CODE: u16 = 255;

/// Resolve a key name to its evdev key code.
///
/// Accepted forms, case-insensitive:
/// - kernel names with or without prefix: `KEY_A`, `a`, `leftmeta`, `F13`
/// - common aliases: `Ctrl`, `Super`, `Super_L`, `Return`, `Escape`, `PgUp`, `-`
/// - raw codes: `#183`
///
/// Returns `None` for unknown names and for keys whose code does not fit the
/// hotkey code space.
pub fn resolve_key(name: &str) -> Option<u8> {
    let name = name.trim();

    if let Some(raw) = name.strip_prefix('#') {
        return raw.parse::<u8>().ok();
    }

    let upper = name.to_uppercase();
    let key = key_alias(&upper)
        .or_else(|| Key::from_str(&format!("KEY_{}", upper)).ok())
        .or_else(|| Key::from_str(&upper).ok())?;

    u8::try_from(key.code()).ok()
}

fn key_alias(upper: &str) -> Option<Key> {
    let key = match upper {
        "CTRL" | "CONTROL" | "CONTROL_L" | "LCTRL" => Key::KEY_LEFTCTRL,
        "CONTROL_R" | "RCTRL" => Key::KEY_RIGHTCTRL,
        "SHIFT" | "SHIFT_L" | "LSHIFT" => Key::KEY_LEFTSHIFT,
        "SHIFT_R" | "RSHIFT" => Key::KEY_RIGHTSHIFT,
        "ALT" | "ALT_L" | "LALT" => Key::KEY_LEFTALT,
        "ALT_R" | "RALT" | "ALTGR" | "ISO_LEVEL3_SHIFT" => Key::KEY_RIGHTALT,
        "SUPER" | "SUPER_L" | "META" | "META_L" | "LMETA" | "WIN" | "MOD" => Key::KEY_LEFTMETA,
        "SUPER_R" | "META_R" | "RMETA" => Key::KEY_RIGHTMETA,
        "ESCAPE" => Key::KEY_ESC,
        "RETURN" => Key::KEY_ENTER,
        "CAPS" | "CAPS_LOCK" => Key::KEY_CAPSLOCK,
        "NUM_LOCK" => Key::KEY_NUMLOCK,
        "SCROLL_LOCK" => Key::KEY_SCROLLLOCK,
        "PRINT" | "PRINTSCREEN" => Key::KEY_SYSRQ,
        "MENU" => Key::KEY_COMPOSE,
        "PGUP" | "PRIOR" | "PAGE_UP" => Key::KEY_PAGEUP,
        "PGDN" | "PGDOWN" | "NEXT" | "PAGE_DOWN" => Key::KEY_PAGEDOWN,
        "INS" => Key::KEY_INSERT,
        "DEL" => Key::KEY_DELETE,
        "MINUS" | "-" => Key::KEY_MINUS,
        "EQUALS" | "=" => Key::KEY_EQUAL,
        "BRACKETLEFT" | "LBRACE" | "[" => Key::KEY_LEFTBRACE,
        "BRACKETRIGHT" | "RBRACE" | "]" => Key::KEY_RIGHTBRACE,
        ";" => Key::KEY_SEMICOLON,
        "'" => Key::KEY_APOSTROPHE,
        "`" => Key::KEY_GRAVE,
        "\\" => Key::KEY_BACKSLASH,
        "," => Key::KEY_COMMA,
        "PERIOD" | "." => Key::KEY_DOT,
        "/" => Key::KEY_SLASH,
        "KP_ENTER" | "NUMPAD_ENTER" => Key::KEY_KPENTER,
        _ => {
            // NUMPAD5 -> KP5
            let digit = upper.strip_prefix("NUMPAD")?;
            return Key::from_str(&format!("KEY_KP{}", digit)).ok();
        }
    };
    Some(key)
}

/// Canonical name of a key code, as printed by the monitor.
///
/// Codes without a kernel name are printed in the raw `#<code>` form, which
/// [`resolve_key`] accepts back.
pub fn key_name(code: u8) -> String {
    let name = format!("{:?}", Key::new(u16::from(code)));
    if name.starts_with("KEY_") || name.starts_with("BTN_") {
        name
    } else {
        format!("#{}", code)
    }
}

/// Resolve a button number or alias.
///
/// Valid numbers are `1..=255`; `left`, `middle` and `right` map to 1, 2 and 3.
pub fn resolve_button(name: &str) -> Option<u8> {
    let name = name.trim();
    match name.to_lowercase().as_str() {
        "left" => Some(1),
        "middle" => Some(2),
        "right" => Some(3),
        _ => match name.parse::<u8>() {
            Ok(0) | Err(_) => None,
            Ok(n) => Some(n),
        },
    }
}

/// Name of a button in the inline hotkey syntax.
pub fn button_name(number: u8) -> String {
    format!("Button{}", number)
}

/// Split a `Button<N>` chord token into its button part.
///
/// Returns `None` when the token names a key instead.
pub fn strip_button_prefix(token: &str) -> Option<&str> {
    let prefix = token.get(..6)?;
    if prefix.eq_ignore_ascii_case("button") && token.len() > 6 {
        Some(&token[6..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(key: Key) -> Option<u8> {
        Some(key.code() as u8)
    }

    #[test]
    fn test_resolve_key_kernel_names() {
        assert_eq!(resolve_key("KEY_A"), code(Key::KEY_A));
        assert_eq!(resolve_key("a"), code(Key::KEY_A));
        assert_eq!(resolve_key("LeftMeta"), code(Key::KEY_LEFTMETA));
        assert_eq!(resolve_key("f13"), code(Key::KEY_F13));
        assert_eq!(resolve_key("1"), code(Key::KEY_1));
        assert_eq!(resolve_key("space"), code(Key::KEY_SPACE));
        assert_eq!(resolve_key("KP5"), code(Key::KEY_KP5));
    }

    #[test]
    fn test_resolve_key_aliases() {
        assert_eq!(resolve_key("Super_L"), code(Key::KEY_LEFTMETA));
        assert_eq!(resolve_key("Control_R"), code(Key::KEY_RIGHTCTRL));
        assert_eq!(resolve_key("Return"), code(Key::KEY_ENTER));
        assert_eq!(resolve_key("Escape"), code(Key::KEY_ESC));
        assert_eq!(resolve_key("PgDn"), code(Key::KEY_PAGEDOWN));
        assert_eq!(resolve_key("-"), code(Key::KEY_MINUS));
        assert_eq!(resolve_key("Numpad7"), code(Key::KEY_KP7));
    }

    #[test]
    fn test_resolve_key_raw_code() {
        assert_eq!(resolve_key("#183"), Some(183));
        assert_eq!(resolve_key("#256"), None);
        assert_eq!(resolve_key("#abc"), None);
    }

    #[test]
    fn test_resolve_key_unknown() {
        assert_eq!(resolve_key("NotAKey"), None);
        assert_eq!(resolve_key(""), None);
    }

    #[test]
    fn test_resolve_key_outside_code_space() {
        // BTN_LEFT is 0x110, buttons go through resolve_button instead
        assert_eq!(resolve_key("BTN_LEFT"), None);
        assert_eq!(resolve_key("KEY_OK"), None);
    }

    #[test]
    fn test_key_name_round_trip() {
        let a = Key::KEY_A.code() as u8;
        assert_eq!(key_name(a), "KEY_A");
        assert_eq!(resolve_key(&key_name(a)), Some(a));
    }

    #[test]
    fn test_resolve_button() {
        assert_eq!(resolve_button("1"), Some(1));
        assert_eq!(resolve_button("255"), Some(255));
        assert_eq!(resolve_button("Left"), Some(1));
        assert_eq!(resolve_button("middle"), Some(2));
        assert_eq!(resolve_button("RIGHT"), Some(3));
        assert_eq!(resolve_button("0"), None);
        assert_eq!(resolve_button("256"), None);
        assert_eq!(resolve_button("-1"), None);
        assert_eq!(resolve_button("wheel"), None);
    }

    #[test]
    fn test_strip_button_prefix() {
        assert_eq!(strip_button_prefix("Button1"), Some("1"));
        assert_eq!(strip_button_prefix("button12"), Some("12"));
        assert_eq!(strip_button_prefix("BUTTONleft"), Some("left"));
        assert_eq!(strip_button_prefix("Button"), None);
        assert_eq!(strip_button_prefix("a"), None);
        assert_eq!(strip_button_prefix("LeftMeta"), None);
    }
}
