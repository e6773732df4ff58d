//! tsh - a tiny login shell with job control
//!
//! # Overview
//!
//! The shell authenticates a user against a colon-separated credential
//! file, then runs a prompt/read/evaluate loop. Builtins execute in the
//! shell's address space; everything else is forked into its own process
//! group and tracked in a bounded job table. A simulated `proc` tree
//! mirrors each known process as a `proc/<pid>/status` record, and a
//! ten-entry history ring is persisted per user.
//!
//! # Pipeline
//!
//! 1. Read one line (`shell`)
//! 2. Tokenize (`parser`)
//! 3. Dispatch a builtin or fork/exec (`eval`, `builtins`)
//! 4. Track the child (`job`, `procfs`)
//! 5. Drive state transitions from signal handlers (`signals`)
//!
//! # Concurrency
//!
//! One OS thread plus asynchronous signal handlers. The handlers and the
//! main loop share the job table and the proc mirror through a single
//! process-wide [`context::ShellContext`]; compound state is guarded by
//! signal masking and the foreground wake-up word is a lock-free atomic.

pub mod auth;
pub mod builtins;
pub mod context;
pub mod eval;
pub mod history;
pub mod job;
pub mod parser;
pub mod procfs;
pub mod report;
pub mod shell;
pub mod signals;

// Re-export commonly used items
pub use auth::{AuthError, UserDb, UserRecord};
pub use context::ShellContext;
pub use history::{History, HISTORY_CAPACITY};
pub use job::{Job, JobState, JobTable, MAX_JOBS};
pub use parser::{parse_line, CommandLine};
pub use procfs::{ProcDir, ProcError, ProcRecord};
pub use shell::Shell;
