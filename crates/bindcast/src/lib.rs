//! Capability-tagged input event dispatch.
//!
//! Two dispatcher flavors share one registration/dispatch core:
//! - [`EventDispatcher`]: routes raw events by subtype.
//! - [`BindDispatcher`]: routes trigger events through a remappable
//!   [`BindTable`], so hooks attach to logical bind names ("advance",
//!   "pause") instead of physical keys.
//!
//! The shared machinery:
//! - [`Callable`] / [`Method`]: hooks with a concurrent-or-sequential
//!   execution marker. Concurrent hooks each run on a fire-and-forget worker
//!   (the [`Spawner`] seam); sequential hooks run inline, isolated so one
//!   failure cannot stop the rest.
//! - [`DeferredTagger`]: methods are tagged for a dispatcher before their
//!   owning type is registered; `register_class` later captures exactly the
//!   entries naming that dispatcher.
//! - Weak instance tracking: `track` records live instances without owning
//!   them; a matched method runs once per live instance.
//! - [`EventHub`] / [`BindHub`]: explicit named-dispatcher registries; the
//!   bind hub owns the canonical shared table and its persistence.
//!
//! Dispatchers are passive: the embedding application's loop pushes events
//! in via `notify`/`notify_all`.

mod bind_dispatch;
mod callable;
mod dispatch;
mod error;
mod event;
mod event_dispatch;
mod registry;
mod spawn;
mod tagger;
mod tracker;

pub mod test_support;

pub use bind_dispatch::{
    BindDispatcher, BindHub, BindTag, KeyDispatcher, KeyHub, PadDispatcher, PadHub,
    SharedBindTable,
};
pub use bindmap::{Bind, BindTable, FileParser, Key, Mods, PadButton, Trigger};
pub use callable::{Callable, ExecMode, Method, MethodKey, Subscriber};
pub use error::{Error, Result};
pub use event::{Event, EventKind};
pub use event_dispatch::{EventDispatcher, EventHub, EventTag};
pub use spawn::{Spawner, ThreadSpawner};
pub use tagger::{DeferredTagger, DispatcherId, Pending};
