//! The interactive session: login, prompt, read, evaluate.

use std::io::{self, BufRead, Write};

use nix::unistd;

use crate::auth::{self, UserDb};
use crate::context::{self, ShellContext};
use crate::history::History;
use crate::job::JobTable;
use crate::procfs::{ProcDir, ProcRecord};
use crate::report;

/// Command line prompt.
pub const PROMPT: &str = "tsh> ";

/// One logged-in shell session.
pub struct Shell {
    pub(crate) ctx: &'static ShellContext,
    pub(crate) history: History,
    pub(crate) users: UserDb,
    emit_prompt: bool,
}

impl Shell {
    /// Authenticate a user, publish the process-wide context, write the
    /// shell's own proc record and hydrate the history ring.
    pub fn login(verbose: bool, emit_prompt: bool) -> Shell {
        let users = UserDb::new("etc/passwd");
        let user = auth::login(&users);

        let sid = unistd::getpid();
        let ctx = context::install(ShellContext::new(
            user.name,
            user.home.clone(),
            sid,
            verbose,
            JobTable::new(verbose),
            ProcDir::new("proc"),
        ));

        // Session-leader record for the shell itself.
        let record = ProcRecord {
            name: "tsh".to_string(),
            pid: sid.as_raw(),
            ppid: unistd::getppid().as_raw(),
            pgid: unistd::getpgrp().as_raw(),
            sid: sid.as_raw(),
            stat: "Ss".to_string(),
            username: ctx.username.clone(),
        };
        if let Err(err) = ctx.proc_dir.write(&record) {
            report::reset_state_error(&err.to_string());
        }

        let history = History::open(&ctx.home);
        Shell {
            ctx,
            history,
            users,
            emit_prompt,
        }
    }

    /// The read/eval loop. Leaves only through `quit`, `logout` or EOF,
    /// all of which exit the process.
    pub fn run(&mut self) -> ! {
        let stdin = io::stdin();
        let mut just_logged_in = true;
        loop {
            if self.emit_prompt {
                if just_logged_in {
                    just_logged_in = false;
                } else {
                    print!("{}", PROMPT);
                    let _ = io::stdout().flush();
                }
            }

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) => self.quit(), // EOF: same orderly shutdown as `quit`
                Ok(_) => self.eval(&line, true),
                Err(err) => report::fatal(&format!("read error: {}", err)),
            }
            let _ = io::stdout().flush();
        }
    }
}
