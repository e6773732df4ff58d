//! One round of the read/eval loop.
//!
//! Builtins run in the shell's own address space; anything else forks a
//! child that execs the program in its own process group. The fork/record
//! sequence is the core critical section: SIGCHLD stays blocked from just
//! before `fork` until the job is in the table, so the reaper can never
//! observe a child whose job does not exist yet.

use std::ffi::{CStr, CString};
use std::process;

use nix::unistd::{self, ForkResult, Pid};

use crate::builtins;
use crate::job::JobState;
use crate::parser;
use crate::procfs::ProcRecord;
use crate::report;
use crate::shell::Shell;
use crate::signals;

impl Shell {
    /// Evaluate one command line. `record` is false when the line came
    /// back out of the history ring, so a replay is never re-persisted.
    pub fn eval(&mut self, cmdline: &str, record: bool) {
        let line = cmdline.trim_end_matches('\n');
        let parsed = parser::parse_line(line);
        if parsed.argv.is_empty() {
            return;
        }

        // `!N` is a replay request; neither it nor the recalled command
        // goes back into history.
        if let Some(n) = builtins::history_request(&parsed.argv[0]) {
            self.run_nth_history(n);
            return;
        }

        if record {
            self.history.record(line);
        }

        if self.dispatch_builtin(&parsed.argv) {
            return;
        }
        self.spawn(line, &parsed.argv, parsed.background);
    }

    /// Fork a child for an external command and track it as a job.
    fn spawn(&mut self, cmdline: &str, argv: &[String], bg: bool) {
        let ctx = self.ctx;
        let state = if bg {
            JobState::Background
        } else {
            JobState::Foreground
        };
        let chld = signals::sigchld_set();
        signals::block(&chld);

        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                let me = unistd::getpid();
                let record = ProcRecord {
                    name: argv[0].clone(),
                    pid: me.as_raw(),
                    ppid: unistd::getppid().as_raw(),
                    pgid: me.as_raw(),
                    sid: ctx.sid.as_raw(),
                    stat: state.stat_code().to_string(),
                    username: ctx.username.clone(),
                };
                let _ = ctx.proc_dir.write(&record);
                // Own process group, so keyboard signals reach only the
                // shell and are relayed by its handlers.
                let _ = unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0));
                signals::unblock(&chld);
                exec_or_die(argv);
            }
            Ok(ForkResult::Parent { child }) => {
                let added = ctx.with_jobs(|jobs| jobs.add(child, state, cmdline));
                if !added {
                    // Untracked child: nothing will ever wake the waiter.
                    signals::unblock(&chld);
                } else if bg {
                    signals::unblock(&chld);
                    println!("{} {}", child, cmdline);
                } else {
                    // SIGCHLD is still blocked here; wait_fg relies on it.
                    signals::wait_fg(ctx, child);
                    signals::unblock(&chld);
                }
            }
            Err(err) => report::fatal(&format!("fork error: {}", err)),
        }
    }
}

/// Child-side exec; never returns. A failed exec reports and exits 0 so
/// the parent reaps a normal exit.
fn exec_or_die(argv: &[String]) -> ! {
    let cstrings: Vec<CString> = argv
        .iter()
        .filter_map(|arg| CString::new(arg.as_str()).ok())
        .collect();
    if cstrings.len() == argv.len() {
        let args: Vec<&CStr> = cstrings.iter().map(CString::as_c_str).collect();
        let _ = unistd::execvp(args[0], &args);
    }
    println!("{}: Command not found.", argv[0]);
    process::exit(0);
}
