//! User-facing error lines.
//!
//! Everything lands on stdout: the shell mirrors stderr onto stdout at
//! startup so a scripted driver sees a single ordered stream.

use std::process;

/// The user did something wrong; tell them and keep going.
pub fn user_error(msg: &str) {
    println!("{}", msg);
}

/// Transient trouble with a state file (history, proc mirror, user db);
/// report and continue with degraded behavior.
pub fn reset_state_error(msg: &str) {
    println!("Error: {}", msg);
}

/// Unrecoverable OS-level failure.
pub fn fatal(msg: &str) -> ! {
    println!("{}", msg);
    process::exit(1);
}
