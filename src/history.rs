//! Command history: a bounded in-memory ring mirrored to a per-user file.
//!
//! Commands are appended to `<home>/.tsh_history` as they are entered, so
//! the file can outgrow the ring between sessions; `persist` rewrites it
//! down to exactly the ring contents on orderly shutdown. Hydration reads
//! the tail of the file: the last ten commands, oldest first.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::report;

/// Size of the in-memory ring.
pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug)]
pub struct History {
    ring: VecDeque<String>,
    path: PathBuf,
}

impl History {
    /// Hydrate the ring from `<home>/.tsh_history`. Trouble opening the
    /// file degrades to an empty ring after a reset-state report.
    pub fn open(home: &Path) -> History {
        let mut history = History {
            ring: VecDeque::with_capacity(HISTORY_CAPACITY),
            path: home.join(".tsh_history"),
        };
        if history.load().is_err() {
            report::reset_state_error(&format!(
                "Could not open {}/.tsh_history file.",
                home.display()
            ));
        }
        history
    }

    fn load(&mut self) -> io::Result<()> {
        let text = fs::read_to_string(&self.path)?;
        let mut tail: Vec<&str> = text
            .lines()
            .filter(|line| !line.is_empty())
            .rev()
            .take(HISTORY_CAPACITY)
            .collect();
        tail.reverse();
        for cmd in tail {
            self.push(cmd);
        }
        Ok(())
    }

    /// Append to the ring, evicting the oldest entry when full.
    pub fn push(&mut self, cmd: &str) {
        if self.ring.len() == HISTORY_CAPACITY {
            self.ring.pop_front();
        }
        self.ring.push_back(cmd.to_string());
    }

    /// Record a freshly entered command: live-append to the file, then
    /// push onto the ring. File trouble degrades with a report.
    pub fn record(&mut self, cmd: &str) {
        match fs::OpenOptions::new().append(true).create(true).open(&self.path) {
            Ok(mut file) => {
                if writeln!(file, "{}", cmd).is_err() {
                    report::reset_state_error("Could not write to history file.");
                }
            }
            Err(_) => {
                report::reset_state_error(&format!(
                    "Could not open {} file.",
                    self.path.display()
                ));
            }
        }
        self.push(cmd);
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// 1-based lookup, oldest first.
    pub fn get(&self, n: usize) -> Option<&str> {
        if n == 0 {
            return None;
        }
        self.ring.get(n - 1).map(String::as_str)
    }

    /// Oldest-first walk of the ring.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ring.iter().map(String::as_str)
    }

    /// Rewrite the file so it holds exactly the ring, oldest first.
    pub fn persist(&self) -> io::Result<()> {
        let mut out = String::new();
        for cmd in &self.ring {
            out.push_str(cmd);
            out.push('\n');
        }
        fs::write(&self.path, out)
    }
}
