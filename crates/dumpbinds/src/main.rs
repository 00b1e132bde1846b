//! Binds file inspector.
//!
//! Loads a binds file into a key hub, prints the resulting table, then reads
//! simulated key lines from stdin (e.g. `space`, `ctrl+shift+p`) and shows
//! which binds fire for each. Useful for checking a binds file without
//! wiring up a real event source.

use std::{
    io::{self, BufRead},
    path::PathBuf,
    process::ExitCode,
    thread,
};

use bindcast::{Callable, Event, EventKind, KeyHub};
use bindmap::{Key, Mods, Trigger, UNASSIGNED_LABEL};
use clap::Parser;
use crossbeam_channel::{Sender, unbounded};
use fileparse::JsonParser;
use tracing::warn;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "dumpbinds", about = "Inspect a binds file and simulate key input")]
struct Cli {
    /// Binds file to load (JSON)
    binds: Option<PathBuf>,

    /// Print the table and exit without reading stdin
    #[arg(long)]
    print_only: bool,

    /// Logging options
    #[command(flatten)]
    logs: logging::LogArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.logs.spec());
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dumpbinds: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Load, print, and (unless `--print-only`) run the simulation loop.
fn run(cli: &Cli) -> bindcast::Result<()> {
    let hub = KeyHub::new();
    if let Some(path) = &cli.binds {
        hub.load_from_file(path, &JsonParser)?;
    }

    print_table(&hub);

    if cli.print_only {
        return Ok(());
    }

    let dispatcher = hub.dispatcher("dump");
    for name in bind_names(&hub) {
        let echo = name.clone();
        dispatcher.bind(
            &name,
            None,
            None,
            EventKind::KEY_DOWN,
            Callable::new("echo", move |event: &Event<Key>| {
                println!("  fired: {echo} ({})", describe(event));
            })
            .sequential(),
        );
    }

    // Feed parsed lines through a channel, the way a real event source
    // pushes into the dispatch loop.
    let (tx, rx) = unbounded();
    let reader = thread::spawn(move || read_stdin(&tx));

    println!("type key lines (e.g. `space`, `ctrl+shift+p`); EOF to quit");
    for event in rx {
        hub.notify_all(&event);
    }
    let _ignored = reader.join();
    Ok(())
}

/// Print the hub's table, one trigger slot per line.
fn print_table(hub: &KeyHub) {
    let table = hub.table();
    let data = table.read().pack();
    if data.is_empty() {
        println!("(no binds)");
        return;
    }
    for (label, entries) in &data {
        let slot = if label == UNASSIGNED_LABEL {
            "(unassigned)".to_string()
        } else {
            label.clone()
        };
        for (name, bits) in entries {
            match bits {
                Some(bits) => {
                    println!("{slot:>14}  {name}  [mods {:?}]", Mods::from_bits_truncate(*bits));
                }
                None => println!("{slot:>14}  {name}"),
            }
        }
    }
}

/// All bind names currently in the hub's table.
fn bind_names(hub: &KeyHub) -> Vec<String> {
    let table = hub.table();
    let data = table.read().pack();
    data.values()
        .flatten()
        .map(|(name, _)| name.clone())
        .collect()
}

/// Read stdin lines, parse them into key events, and push them down the
/// channel until EOF or the receiver goes away.
fn read_stdin(tx: &Sender<Event<Key>>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            return;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(event) => {
                if tx.send(event).is_err() {
                    return;
                }
            }
            None => warn!(input = line, "unrecognized key line"),
        }
    }
}

/// Parse a `mod+...+key` line into a key-down event.
fn parse_line(line: &str) -> Option<Event<Key>> {
    let mut mods = Mods::empty();
    let mut parts = line.split('+').peekable();
    while let Some(part) = parts.next() {
        let part = part.trim().to_ascii_lowercase();
        if parts.peek().is_none() {
            let key = Key::from_label(&part)?;
            return Some(Event::new(EventKind::KEY_DOWN).with_trigger(key).with_mods(mods));
        }
        mods |= match part.as_str() {
            "shift" => Mods::SHIFT,
            "ctrl" => Mods::CTRL,
            "alt" => Mods::ALT,
            "gui" | "super" | "cmd" => Mods::GUI,
            _ => return None,
        };
    }
    None
}

/// Short human form of an event for echo output.
fn describe(event: &Event<Key>) -> String {
    let trigger = event.trigger.map_or_else(|| "?".to_string(), |k| k.label());
    match event.mods {
        Some(mods) if !mods.is_empty() => format!("{trigger} with {mods:?}"),
        _ => trigger,
    }
}
