//! End-to-end tests exercising the public engine API.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use bindcast::{
    BindDispatcher, BindHub, BindTable, Callable, DeferredTagger, Event, EventKind, Key, KeyHub,
    Method, MethodKey, Mods, PadButton, PadHub, Subscriber,
    test_support::{InlineSpawner, counting_hook},
};
use fileparse::JsonParser;
use parking_lot::{Mutex, RwLock};

/// A game object whose methods get captured by dispatchers.
struct Sprite {
    advances: AtomicUsize,
    pauses: AtomicUsize,
}

impl Sprite {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            advances: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
        })
    }
}

impl Subscriber<Key> for Sprite {
    fn hooks() -> Vec<Method<Key>> {
        vec![
            Method::of::<Self, _>("on_advance", |sprite, _event| {
                sprite.advances.fetch_add(1, Ordering::SeqCst);
            }),
            Method::of::<Self, _>("on_pause", |sprite, _event| {
                sprite.pauses.fetch_add(1, Ordering::SeqCst);
            }),
        ]
    }
}

fn key_hub() -> KeyHub {
    BindHub::with_spawner(Arc::new(InlineSpawner))
}

fn key_down(key: Key, mods: Mods) -> Event<Key> {
    Event::new(EventKind::KEY_DOWN).with_trigger(key).with_mods(mods)
}

#[test]
fn event_fans_out_to_every_live_instance() {
    let hub = key_hub();
    let disp = hub.dispatcher("game");
    disp.bind_method::<Sprite>("advance", Some(Key::SPACE), None, EventKind::KEY_DOWN, "on_advance");
    disp.register_class::<Sprite>();

    let sprites = [Sprite::new(), Sprite::new(), Sprite::new()];
    for sprite in &sprites {
        disp.track(sprite);
    }

    disp.notify(&key_down(Key::SPACE, Mods::empty()));
    for sprite in &sprites {
        assert_eq!(sprite.advances.load(Ordering::SeqCst), 1);
    }

    disp.notify(&key_down(Key::RETURN, Mods::empty()));
    for sprite in &sprites {
        assert_eq!(sprite.advances.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn dropped_instances_stop_receiving() {
    let hub = key_hub();
    let disp = hub.dispatcher("game");
    disp.bind_method::<Sprite>("advance", Some(Key::SPACE), None, EventKind::KEY_DOWN, "on_advance");
    disp.register_class::<Sprite>();

    let keep = Sprite::new();
    let drop_me = Sprite::new();
    disp.track(&keep);
    disp.track(&drop_me);

    disp.notify(&key_down(Key::SPACE, Mods::empty()));
    assert_eq!(keep.advances.load(Ordering::SeqCst), 1);
    assert_eq!(drop_me.advances.load(Ordering::SeqCst), 1);

    drop(drop_me);
    disp.notify(&key_down(Key::SPACE, Mods::empty()));
    assert_eq!(keep.advances.load(Ordering::SeqCst), 2);
}

#[test]
fn two_dispatchers_capture_their_own_tags() {
    let table = Arc::new(RwLock::new(BindTable::new()));
    let tagger = Arc::new(DeferredTagger::new());
    let spawner = Arc::new(InlineSpawner);
    let first: BindDispatcher<Key> =
        BindDispatcher::with_spawner("first", table.clone(), tagger.clone(), spawner.clone());
    let second: BindDispatcher<Key> =
        BindDispatcher::with_spawner("second", table, tagger.clone(), spawner);

    first.bind_method::<Sprite>("advance", Some(Key::SPACE), None, EventKind::KEY_DOWN, "on_advance");
    second.bind_method::<Sprite>("pause", Some(Key::ESCAPE), None, EventKind::KEY_DOWN, "on_pause");

    let key = MethodKey::of::<Sprite>("on_advance");
    assert_eq!(tagger.pending_count(key), 1);

    first.register_class::<Sprite>();
    // First consumed only its own entry; the second dispatcher's tag remains.
    assert_eq!(tagger.pending_count(key), 0);
    assert_eq!(tagger.pending_count(MethodKey::of::<Sprite>("on_pause")), 1);

    second.register_class::<Sprite>();
    assert_eq!(tagger.pending_count(MethodKey::of::<Sprite>("on_pause")), 0);

    let sprite = Sprite::new();
    first.track(&sprite);
    second.track(&sprite);

    first.notify(&key_down(Key::SPACE, Mods::empty()));
    second.notify(&key_down(Key::ESCAPE, Mods::empty()));
    assert_eq!(sprite.advances.load(Ordering::SeqCst), 1);
    assert_eq!(sprite.pauses.load(Ordering::SeqCst), 1);

    // Each dispatcher captured only its own bind.
    second.notify(&key_down(Key::SPACE, Mods::empty()));
    assert_eq!(sprite.advances.load(Ordering::SeqCst), 1);
}

#[test]
fn deregister_class_silences_all_instances() {
    let hub = key_hub();
    let disp = hub.dispatcher("game");
    disp.bind_method::<Sprite>("advance", Some(Key::SPACE), None, EventKind::KEY_DOWN, "on_advance");
    disp.register_class::<Sprite>();

    let sprite = Sprite::new();
    disp.track(&sprite);
    disp.notify(&key_down(Key::SPACE, Mods::empty()));
    assert_eq!(sprite.advances.load(Ordering::SeqCst), 1);

    disp.deregister_class::<Sprite>();
    disp.notify(&key_down(Key::SPACE, Mods::empty()));
    assert_eq!(sprite.advances.load(Ordering::SeqCst), 1);
}

#[test]
fn sequential_hooks_run_in_order_and_survive_panics() {
    let hub = key_hub();
    let disp = hub.dispatcher("game");
    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let first_order = order.clone();
    let first = Callable::new("first", move |_| first_order.lock().push("first")).sequential();
    let faulty = Callable::<Key>::new("faulty", |_| panic!("handler bug")).sequential();
    let last_order = order.clone();
    let last = Callable::new("last", move |_| last_order.lock().push("last")).sequential();

    disp.bind("advance", Some(Key::SPACE), None, EventKind::KEY_DOWN, first);
    disp.bind("advance", Some(Key::SPACE), None, EventKind::KEY_DOWN, faulty);
    disp.bind("advance", Some(Key::SPACE), None, EventKind::KEY_DOWN, last);

    disp.notify(&key_down(Key::SPACE, Mods::empty()));
    assert_eq!(*order.lock(), vec!["first", "last"]);
}

#[test]
fn load_merges_without_clobbering_defaults() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("bindcast-it-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{"return": [["advance", null]], "escape": [["pause", null]]}"#,
    )
    .unwrap();

    let hub = key_hub();
    let disp = hub.dispatcher("game");
    let (hook, count) = counting_hook("advance");
    disp.bind("advance", Some(Key::SPACE), None, EventKind::KEY_DOWN, hook);

    hub.load_from_file(&path, &JsonParser).unwrap();
    std::fs::remove_file(&path).ok();

    // "advance" already existed: the programmatic default keeps its trigger.
    assert_eq!(disp.bound_trigger("advance").unwrap(), (Some(Key::SPACE), None));
    // "pause" came only from the file and is now available to hook onto.
    assert_eq!(disp.bound_trigger("pause").unwrap(), (Some(Key::ESCAPE), None));

    disp.notify(&key_down(Key::SPACE, Mods::empty()));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn save_and_reload_round_trips_the_table() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("bindcast-rt-{}.json", std::process::id()));

    let hub = key_hub();
    let disp = hub.dispatcher("game");
    let (hook, _count) = counting_hook("advance");
    disp.bind("advance", Some(Key::SPACE), Some(Mods::CTRL), EventKind::KEY_DOWN, hook);
    disp.rebind("advance", Some(Key::RETURN), Some(Mods::CTRL));
    hub.save_to_file(&path, &JsonParser).unwrap();

    let fresh = key_hub();
    fresh.load_from_file(&path, &JsonParser).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(
        fresh.dispatcher("game").bound_trigger("advance").unwrap(),
        (Some(Key::RETURN), Some(Mods::CTRL))
    );
}

#[test]
fn pad_binds_share_the_same_machinery() {
    struct Cursor {
        confirms: AtomicUsize,
    }

    impl Subscriber<PadButton> for Cursor {
        fn hooks() -> Vec<Method<PadButton>> {
            vec![Method::of::<Self, _>("on_confirm", |cursor, _event| {
                cursor.confirms.fetch_add(1, Ordering::SeqCst);
            })]
        }
    }

    let hub: PadHub = BindHub::with_spawner(Arc::new(InlineSpawner));
    let disp = hub.dispatcher("menu");
    disp.bind_method::<Cursor>(
        "confirm",
        Some(PadButton::SOUTH),
        None,
        EventKind::PAD_DOWN,
        "on_confirm",
    );
    disp.register_class::<Cursor>();

    let cursor = Arc::new(Cursor {
        confirms: AtomicUsize::new(0),
    });
    disp.track(&cursor);

    hub.notify_all(&Event::new(EventKind::PAD_DOWN).with_trigger(PadButton::SOUTH));
    hub.notify_all(&Event::new(EventKind::PAD_DOWN).with_trigger(PadButton::EAST));
    assert_eq!(cursor.confirms.load(Ordering::SeqCst), 1);
}
