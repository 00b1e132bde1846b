//! Physical trigger identifiers and the modifier bitmask.

use std::{fmt, hash::Hash};

use bitflags::bitflags;

/// A physical input identifier a bind can be mapped to.
///
/// Implementations must provide a stable string label: it is the wire form
/// used when a bind table is packed for persistence, and must survive a
/// round-trip through [`Trigger::from_label`].
pub trait Trigger:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Stable wire label for this trigger.
    fn label(&self) -> String;

    /// Parse a wire label produced by [`Trigger::label`].
    fn from_label(label: &str) -> Option<Self>;
}

bitflags! {
    /// Bitmask of auxiliary input state held alongside a trigger.
    ///
    /// An empty mask is meaningful: a bind requiring `Mods::empty()` fires
    /// only when the event reports that no modifiers are held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Mods: u32 {
        /// Either shift key.
        const SHIFT = 1 << 0;
        /// Either control key.
        const CTRL = 1 << 1;
        /// Either alt/option key.
        const ALT = 1 << 2;
        /// The OS/GUI key (command, super).
        const GUI = 1 << 3;
    }
}

/// A keyboard key.
///
/// Codes for printable keys are their ASCII values (letters canonically
/// lowercase); control and navigation keys use the reserved range above
/// `0x100`. The embedding application owns the full vocabulary; these
/// constants just cover the common cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(pub u16);

impl Key {
    /// Backspace.
    pub const BACKSPACE: Self = Self(8);
    /// Tab.
    pub const TAB: Self = Self(9);
    /// Return/enter.
    pub const RETURN: Self = Self(13);
    /// Escape.
    pub const ESCAPE: Self = Self(27);
    /// Space bar.
    pub const SPACE: Self = Self(32);
    /// Forward delete.
    pub const DELETE: Self = Self(127);
    /// Up arrow.
    pub const UP: Self = Self(0x100);
    /// Down arrow.
    pub const DOWN: Self = Self(0x101);
    /// Left arrow.
    pub const LEFT: Self = Self(0x102);
    /// Right arrow.
    pub const RIGHT: Self = Self(0x103);

    /// Key for a printable ASCII character, if there is one.
    pub fn from_char(ch: char) -> Option<Self> {
        if ch.is_ascii_graphic() || ch == ' ' {
            Some(Self(ch.to_ascii_lowercase() as u16))
        } else {
            None
        }
    }

    /// Name for keys that have one.
    fn name(self) -> Option<&'static str> {
        match self {
            Self::BACKSPACE => Some("backspace"),
            Self::TAB => Some("tab"),
            Self::RETURN => Some("return"),
            Self::ESCAPE => Some("escape"),
            Self::SPACE => Some("space"),
            Self::DELETE => Some("delete"),
            Self::UP => Some("up"),
            Self::DOWN => Some("down"),
            Self::LEFT => Some("left"),
            Self::RIGHT => Some("right"),
            _ => None,
        }
    }
}

impl Trigger for Key {
    fn label(&self) -> String {
        if let Some(name) = self.name() {
            return name.to_string();
        }
        match u8::try_from(self.0).ok().filter(u8::is_ascii_graphic) {
            Some(byte) => (byte as char).to_string(),
            // Prefixed so raw codes can't collide with digit keys.
            None => format!("key:{}", self.0),
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        let named = match label {
            "backspace" => Some(Self::BACKSPACE),
            "tab" => Some(Self::TAB),
            "return" => Some(Self::RETURN),
            "escape" => Some(Self::ESCAPE),
            "space" => Some(Self::SPACE),
            "delete" => Some(Self::DELETE),
            "up" => Some(Self::UP),
            "down" => Some(Self::DOWN),
            "left" => Some(Self::LEFT),
            "right" => Some(Self::RIGHT),
            _ => None,
        };
        if named.is_some() {
            return named;
        }
        let mut chars = label.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Self::from_char(ch);
        }
        label.strip_prefix("key:")?.parse::<u16>().ok().map(Self)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A game pad button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PadButton(pub u8);

impl PadButton {
    /// Bottom face button.
    pub const SOUTH: Self = Self(0);
    /// Right face button.
    pub const EAST: Self = Self(1);
    /// Left face button.
    pub const WEST: Self = Self(2);
    /// Top face button.
    pub const NORTH: Self = Self(3);
    /// Start button.
    pub const START: Self = Self(4);
    /// Select/back button.
    pub const SELECT: Self = Self(5);
}

impl Trigger for PadButton {
    fn label(&self) -> String {
        format!("button{}", self.0)
    }

    fn from_label(label: &str) -> Option<Self> {
        label.strip_prefix("button")?.parse::<u8>().ok().map(Self)
    }
}

impl fmt::Display for PadButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_labels_round_trip() {
        for key in [
            Key::SPACE,
            Key::RETURN,
            Key::UP,
            Key::from_char('a').unwrap(),
            Key::from_char('0').unwrap(),
            Key(0x2ff),
        ] {
            assert_eq!(Key::from_label(&key.label()), Some(key), "{key:?}");
        }
    }

    #[test]
    fn digit_labels_parse_as_characters() {
        // A single digit is a printable key, not a raw code.
        assert_eq!(Key::from_label("0"), Some(Key(b'0' as u16)));
        assert_eq!(Key::from_label("key:48"), Some(Key(48)));
        assert_eq!(Key::from_label("key:x"), None);
    }

    #[test]
    fn pad_labels_round_trip() {
        let btn = PadButton::NORTH;
        assert_eq!(PadButton::from_label(&btn.label()), Some(btn));
        assert_eq!(PadButton::from_label("space"), None);
    }
}
