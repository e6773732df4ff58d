//! Round-trip tests for the history ring and its backing file.

use std::fs;

use tsh::history::{History, HISTORY_CAPACITY};

mod common;
use common::Scratch;

#[test]
fn hydration_restores_persisted_commands_in_order() {
    let home = Scratch::new("history");
    let mut history = History::open(&home.root);
    assert!(history.is_empty());

    for cmd in ["ls", "echo one", "sleep 1 &"] {
        history.record(cmd);
    }
    history.persist().unwrap();

    let reloaded = History::open(&home.root);
    let seen: Vec<&str> = reloaded.iter().collect();
    assert_eq!(seen, vec!["ls", "echo one", "sleep 1 &"]);
}

#[test]
fn hydration_keeps_only_the_file_tail() {
    let home = Scratch::new("history_tail");
    let lines: Vec<String> = (0..25).map(|i| format!("cmd{}", i)).collect();
    fs::write(home.path(".tsh_history"), lines.join("\n") + "\n").unwrap();

    let history = History::open(&home.root);
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert_eq!(history.get(1), Some("cmd15"));
    assert_eq!(history.get(HISTORY_CAPACITY), Some("cmd24"));
}

#[test]
fn live_appends_grow_the_file_until_persist_truncates() {
    let home = Scratch::new("history_truncate");
    fs::write(home.path(".tsh_history"), "").unwrap();

    let mut history = History::open(&home.root);
    for i in 0..HISTORY_CAPACITY + 5 {
        history.record(&format!("cmd{}", i));
    }

    // The file grew past the ring while the session ran.
    let text = fs::read_to_string(home.path(".tsh_history")).unwrap();
    assert_eq!(text.lines().count(), HISTORY_CAPACITY + 5);

    // Orderly shutdown rewrites it down to exactly the ring.
    history.persist().unwrap();
    let text = fs::read_to_string(home.path(".tsh_history")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), HISTORY_CAPACITY);
    assert_eq!(lines[0], "cmd5");
    assert_eq!(lines[HISTORY_CAPACITY - 1], "cmd14");
}

#[test]
fn missing_file_degrades_to_an_empty_ring() {
    let home = Scratch::new("history_missing");
    let history = History::open(&home.root);
    assert!(history.is_empty());
}
