//! tsh - a tiny login shell with job control.
//!
//! Usage:
//!   shell         interactive session
//!   shell -v      emit additional diagnostic information
//!   shell -p      suppress the prompt (for scripted drivers)

use std::env;
use std::io;
use std::os::unix::io::AsRawFd;
use std::process::ExitCode;

use nix::unistd;

use tsh::report;
use tsh::shell::Shell;
use tsh::signals;

fn print_usage() {
    println!("Usage: shell [-hvp]");
    println!("   -h   print this message");
    println!("   -v   print additional diagnostic information");
    println!("   -p   do not emit a command prompt");
}

fn main() -> ExitCode {
    let mut verbose = false;
    let mut emit_prompt = true;

    for arg in env::args().skip(1) {
        let Some(flags) = arg.strip_prefix('-') else {
            print_usage();
            return ExitCode::FAILURE;
        };
        for flag in flags.chars() {
            match flag {
                'h' => {
                    print_usage();
                    return ExitCode::SUCCESS;
                }
                'v' => verbose = true,
                'p' => emit_prompt = false,
                _ => {
                    print_usage();
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    // Mirror stderr onto stdout so a scripted driver reads one stream.
    if unistd::dup2(io::stdout().as_raw_fd(), io::stderr().as_raw_fd()).is_err() {
        eprintln!("dup2 error");
        return ExitCode::FAILURE;
    }

    if let Err(err) = signals::install_handlers() {
        report::fatal(&format!("Signal error: {}", err));
    }

    Shell::login(verbose, emit_prompt).run()
}
