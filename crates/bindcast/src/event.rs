//! Runtime events pushed into dispatchers by the embedding application.

use std::fmt;

use bindmap::{Mods, Trigger};

/// Identifier for a runtime event subtype.
///
/// The full vocabulary belongs to the event source; the constants here cover
/// the subtypes this crate's own tooling and tests speak about. Any other
/// `u16` is a valid kind as far as dispatch is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKind(pub u16);

impl EventKind {
    /// A key was pressed.
    pub const KEY_DOWN: Self = Self(1);
    /// A key was released.
    pub const KEY_UP: Self = Self(2);
    /// A pad button was pressed.
    pub const PAD_DOWN: Self = Self(3);
    /// A pad button was released.
    pub const PAD_UP: Self = Self(4);
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::KEY_DOWN => f.write_str("key-down"),
            Self::KEY_UP => f.write_str("key-up"),
            Self::PAD_DOWN => f.write_str("pad-down"),
            Self::PAD_UP => f.write_str("pad-up"),
            Self(other) => write!(f, "kind:{other}"),
        }
    }
}

/// A runtime event: a subtype, and optionally the physical trigger and
/// modifier state that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event<T: Trigger> {
    /// Event subtype.
    pub kind: EventKind,
    /// Physical trigger, when the subtype carries one.
    pub trigger: Option<T>,
    /// Modifier state held when the event was produced. `None` means the
    /// source did not report modifier state at all.
    pub mods: Option<Mods>,
}

impl<T: Trigger> Event<T> {
    /// An event of the given subtype with no trigger or modifier state.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            trigger: None,
            mods: None,
        }
    }

    /// Attach the physical trigger.
    pub fn with_trigger(mut self, trigger: T) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Attach reported modifier state.
    pub fn with_mods(mut self, mods: Mods) -> Self {
        self.mods = Some(mods);
        self
    }
}
