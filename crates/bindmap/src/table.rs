//! The trigger → bind mapping and its persistence shape.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::{
    bind::Bind,
    error::{Error, Result},
    trigger::{Mods, Trigger},
};

/// Wire label for the unassigned pseudo-trigger slot.
pub const UNASSIGNED_LABEL: &str = "null";

/// Serializable shape of a packed table: trigger label → `(name, mods bits)`
/// pairs. The unassigned slot packs under [`UNASSIGNED_LABEL`].
pub type TableData = BTreeMap<String, Vec<(String, Option<u32>)>>;

/// Mapping from physical triggers to the logical binds they produce.
///
/// A bind name appears under at most one trigger at any time. The `None` slot
/// holds binds that are currently unassigned: they are remembered (and
/// persisted) but never fire.
#[derive(Debug, Clone)]
pub struct BindTable<T: Trigger> {
    slots: HashMap<Option<T>, Vec<Bind>>,
}

impl<T: Trigger> Default for BindTable<T> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<T: Trigger> BindTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a bind with this name exists anywhere in the table.
    pub fn contains(&self, name: &str) -> bool {
        self.slots
            .values()
            .any(|binds| binds.iter().any(|b| b.name == name))
    }

    /// Register a bind name if it is not already present.
    ///
    /// Idempotent: an existing bind keeps its current trigger and modifier
    /// requirement no matter what defaults are supplied here.
    pub fn generate(&mut self, name: &str, default_trigger: Option<T>, default_mods: Option<Mods>) {
        if self.contains(name) {
            return;
        }
        debug!(bind = name, trigger = ?default_trigger, "generating bind");
        self.slots
            .entry(default_trigger)
            .or_default()
            .push(Bind::new(name, default_mods));
    }

    /// Current placement of a bind: its trigger slot and modifier requirement.
    ///
    /// Fails with [`Error::UnknownBind`] when the name was never generated;
    /// callers are expected to call [`BindTable::generate`] first.
    pub fn bound_trigger(&self, name: &str) -> Result<(Option<T>, Option<Mods>)> {
        for (trigger, binds) in &self.slots {
            if let Some(bind) = binds.iter().find(|b| b.name == name) {
                return Ok((*trigger, bind.mods));
            }
        }
        Err(Error::UnknownBind(name.to_string()))
    }

    /// Move a bind to a new trigger, returning its previous placement.
    ///
    /// Every occurrence of the name is removed first (now-empty slots are
    /// pruned), then `bind` is inserted under `new_trigger`. Passing `None`
    /// parks the bind in the unassigned slot.
    pub fn rebind(&mut self, bind: Bind, new_trigger: Option<T>) -> Option<(Option<T>, Option<Mods>)> {
        let previous = self.bound_trigger(&bind.name).ok();
        self.slots
            .values_mut()
            .for_each(|binds| binds.retain(|b| b.name != bind.name));
        self.slots.retain(|_, binds| !binds.is_empty());
        self.slots.entry(new_trigger).or_default().push(bind);
        previous
    }

    /// Remove a bind name from a specific trigger slot, or from every slot
    /// when no trigger is given. Removing something absent is a warning, not
    /// an error.
    pub fn remove(&mut self, name: &str, trigger: Option<T>) {
        if let Some(t) = trigger {
            let Some(binds) = self.slots.get_mut(&Some(t)) else {
                warn!(bind = name, trigger = %t, "cannot remove bind: trigger has no binds");
                return;
            };
            let before = binds.len();
            binds.retain(|b| b.name != name);
            if binds.len() == before {
                warn!(bind = name, trigger = %t, "cannot remove bind: not present under trigger");
            }
            return;
        }
        self.slots
            .values_mut()
            .for_each(|binds| binds.retain(|b| b.name != name));
    }

    /// Copy binds from `other` that this table does not know by name.
    ///
    /// Names present in both keep this table's placement and modifier
    /// requirement; only absent names are copied, at their placement in
    /// `other`. Merge direction therefore decides which side wins.
    pub fn merge(&mut self, other: &Self) {
        for (trigger, binds) in &other.slots {
            for bind in binds {
                if self.contains(&bind.name) {
                    continue;
                }
                debug!(bind = %bind.name, trigger = ?trigger, "merging bind");
                self.slots.entry(*trigger).or_default().push(bind.clone());
            }
        }
    }

    /// Binds currently mapped to a trigger slot.
    pub fn binds_at(&self, trigger: Option<T>) -> &[Bind] {
        self.slots.get(&trigger).map_or(&[], Vec::as_slice)
    }

    /// Total number of binds across all slots.
    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    /// Whether the table holds no binds at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pack into the serializable wire shape. Empty slots are skipped.
    pub fn pack(&self) -> TableData {
        let mut data = TableData::new();
        for (trigger, binds) in &self.slots {
            if binds.is_empty() {
                continue;
            }
            let label = trigger.map_or_else(|| UNASSIGNED_LABEL.to_string(), |t| t.label());
            let entries = binds
                .iter()
                .map(|b| (b.name.clone(), b.mods.map(|m| m.bits())))
                .collect();
            data.insert(label, entries);
        }
        data
    }

    /// Rebuild a table from its wire shape.
    pub fn unpack(data: &TableData) -> Result<Self> {
        let mut table = Self::new();
        for (label, entries) in data {
            let trigger = if label == UNASSIGNED_LABEL {
                None
            } else {
                Some(T::from_label(label).ok_or_else(|| Error::UnknownTrigger(label.clone()))?)
            };
            let binds = entries
                .iter()
                .map(|(name, bits)| Bind::new(name.clone(), bits.map(Mods::from_bits_truncate)))
                .collect();
            table.slots.insert(trigger, binds);
        }
        Ok(table)
    }
}
