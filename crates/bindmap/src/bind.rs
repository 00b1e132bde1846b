//! Named logical binds and their modifier-matching rule.

use crate::trigger::Mods;

/// A named logical action with an optional modifier requirement.
///
/// Identity is structural: two binds are equal when their name and modifier
/// requirement are equal. `mods` of `None` is the wildcard, firing regardless
/// of held modifiers. `Some(Mods::empty())` is the opposite sentinel: the
/// bind fires only when no modifiers are held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bind {
    /// Reference name callables hook onto.
    pub name: String,
    /// Modifier requirement; `None` accepts any modifier state.
    pub mods: Option<Mods>,
}

impl Bind {
    /// Create a bind with the given name and modifier requirement.
    pub fn new(name: impl Into<String>, mods: Option<Mods>) -> Self {
        Self {
            name: name.into(),
            mods,
        }
    }

    /// Whether an event carrying `held` modifier state matches this bind.
    ///
    /// Matches when the requirement is the wildcard, when the held mask
    /// overlaps the required mask, or when the two are exactly equal. The
    /// equality arm is what lets an empty required mask (the "no modifiers"
    /// sentinel) fire, since it can never pass the overlap test.
    pub fn matches(&self, held: Option<Mods>) -> bool {
        match self.mods {
            None => true,
            Some(required) => {
                held.is_some_and(|h| required.intersects(h)) || held == Some(required)
            }
        }
    }
}
