//! Builtin commands, executed in the shell's own address space.
//!
//! Job state transitions driven from here:
//!
//! ```text
//! ST --fg--> FG   (SIGCONT to the process group, then wait)
//! ST --bg--> BG   (SIGCONT to the process group)
//! BG --fg--> FG   (wait only)
//! ```
//!
//! Whenever a transition changes the mirrored stat, the proc record is
//! edited before any signal goes out, so an external observer never sees
//! a stale stat on a resumed process.

use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::auth::UserRecord;
use crate::job::JobState;
use crate::procfs::ProcError;
use crate::report;
use crate::shell::Shell;
use crate::signals;

/// `Some(N)` when argv0 is a bang followed by digits, i.e. a `!N`
/// history replay request.
pub fn history_request(argv0: &str) -> Option<usize> {
    let digits = argv0.strip_prefix('!')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl Shell {
    /// Dispatch argv to a builtin. Returns false when argv names an
    /// external program.
    pub fn dispatch_builtin(&mut self, argv: &[String]) -> bool {
        match argv[0].as_str() {
            "quit" => self.quit(),
            "logout" => {
                self.logout();
                true
            }
            "jobs" => {
                self.ctx.with_jobs(|jobs| jobs.list());
                true
            }
            "bg" | "fg" => {
                self.do_bgfg(argv);
                true
            }
            "history" => {
                self.show_history();
                true
            }
            "adduser" => {
                self.add_user(argv);
                true
            }
            _ => false,
        }
    }

    /// Orderly shutdown: persist the history ring over the history file,
    /// scrub the proc mirror, exit 0.
    pub fn quit(&mut self) -> ! {
        if self.history.persist().is_err() {
            report::reset_state_error("Could not write to history file.");
        }
        let _ = self.ctx.proc_dir.remove(self.ctx.sid.as_raw());
        if let Err(err) = self.ctx.proc_dir.remove_all() {
            report::reset_state_error(&err.to_string());
        }
        process::exit(0);
    }

    /// `quit`, unless jobs are still open.
    fn logout(&mut self) {
        if self.ctx.with_jobs(|jobs| jobs.any_open()) {
            report::user_error("There are suspended jobs.");
        } else {
            self.quit();
        }
    }

    fn show_history(&self) {
        println!("History (last 10 commands used from least to most recent):");
        for (i, cmd) in self.history.iter().enumerate() {
            println!("{}. {}", i + 1, cmd);
        }
    }

    /// Replay the Nth ring entry, 1-based, without re-persisting it.
    pub(crate) fn run_nth_history(&mut self, n: usize) {
        let Some(cmd) = self.history.get(n).map(str::to_string) else {
            report::reset_state_error(&format!(
                "Called command {} from history, however only {} commands present in history.",
                n,
                self.history.len()
            ));
            return;
        };
        self.eval(&cmd, false);
    }

    fn do_bgfg(&mut self, argv: &[String]) {
        let to_fg = argv[0] == "fg";
        let Some(arg) = argv.get(1) else {
            report::user_error(&format!(
                "{} command requires a pid or jid argument.",
                argv[0]
            ));
            return;
        };
        let Ok(id) = arg.parse::<i32>() else {
            report::user_error(&format!("{}: argument must be a pid or jid.", argv[0]));
            return;
        };

        // A pid argument resolves through the table; anything the table
        // does not know as a pid is taken as a jid.
        let ctx = self.ctx;
        let target = ctx.with_jobs(|jobs| {
            let jid = match jobs.pid_to_jid(Pid::from_raw(id)) {
                0 => id,
                jid => jid,
            };
            jobs.get_by_jid(jid)
                .map(|job| (job.pid, job.jid, job.state, job.cmdline.clone()))
        });
        let Some((pid, jid, state, cmdline)) = target else {
            report::user_error(&format!("Job ({}) does not exist.", id));
            return;
        };

        match (to_fg, state) {
            (false, JobState::Foreground) => {
                report::user_error(&format!(
                    "Job ({}) must be stopped before moving to the background.",
                    jid
                ));
            }
            (false, JobState::Background) => {
                report::user_error(&format!("Job ({}) is already in the background.", jid));
            }
            (true, JobState::Foreground) => {
                report::user_error(&format!("Job ({}) is already in the foreground.", jid));
            }
            (false, JobState::Stopped) => {
                // Mirror first, then the table, then the signal.
                edit_proc_stat(self, pid, "R");
                ctx.with_jobs(|jobs| {
                    if let Some(job) = jobs.get_by_pid_mut(pid) {
                        job.state = JobState::Background;
                    }
                });
                let _ = signal::kill(Pid::from_raw(-pid.as_raw()), Signal::SIGCONT);
                println!("[{}] ({}) {}", jid, pid, cmdline);
            }
            (true, JobState::Stopped) | (true, JobState::Background) => {
                let resume = state == JobState::Stopped;
                edit_proc_stat(self, pid, "R+");
                let chld = signals::sigchld_set();
                signals::block(&chld);
                // An earlier stop of this job while it ran in the
                // background may have left its pid in the wake-up word;
                // that tenure is over, so drop it before waiting.
                ctx.fg_pid.store(0, Ordering::SeqCst);
                ctx.with_jobs(|jobs| {
                    if let Some(job) = jobs.get_by_pid_mut(pid) {
                        job.state = JobState::Foreground;
                    }
                });
                if resume {
                    let _ = signal::kill(Pid::from_raw(-pid.as_raw()), Signal::SIGCONT);
                }
                signals::wait_fg(ctx, pid);
                signals::unblock(&chld);
            }
            (_, JobState::Undefined) => {}
        }
    }

    /// Root-only: create a home directory with an empty history file and
    /// append a credential line to the user database.
    fn add_user(&mut self, argv: &[String]) {
        let name = argv.get(1).map(String::as_str).unwrap_or("");
        let password = argv.get(2).map(String::as_str).unwrap_or("");
        if name.is_empty() || password.is_empty() {
            report::user_error(&format!(
                "Invalid username ({}) or password({}) provided.",
                name, password
            ));
            return;
        }

        if self.ctx.username != "root" {
            report::user_error("root privileges required to run adduser.");
            return;
        }

        match self.users.user_exists(name) {
            Ok(true) => {
                report::user_error(&format!("User {} may already exist.", name));
                return;
            }
            Ok(false) => {}
            Err(err) => {
                report::reset_state_error(&err.to_string());
                return;
            }
        }

        let home = PathBuf::from(format!("home/{}", name));
        if fs::DirBuilder::new().mode(0o700).create(&home).is_err() {
            report::reset_state_error("Could not create user directory.");
        }
        if fs::File::create(home.join(".tsh_history")).is_err() {
            report::reset_state_error("Could not create .tsh_history file.");
        }

        let record = UserRecord {
            name: name.to_string(),
            password: password.to_string(),
            home,
        };
        if let Err(err) = self.users.append(&record) {
            report::reset_state_error(&err.to_string());
        }
    }
}

fn edit_proc_stat(shell: &Shell, pid: Pid, stat: &str) {
    match shell.ctx.proc_dir.edit_state(pid.as_raw(), stat) {
        // A record the reaper already collected is not worth a report.
        Ok(()) | Err(ProcError::Missing(_)) => {}
        Err(err) => report::reset_state_error(&err.to_string()),
    }
}
