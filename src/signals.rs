//! Signal handling for the shell.
//!
//! Four handlers are installed with `SA_RESTART`: SIGCHLD reaps and
//! retires jobs, SIGINT and SIGTSTP relay the keyboard to the foreground
//! process group, SIGQUIT gives a driver a clean way to kill the shell.
//! The handlers run on the main thread's stack at arbitrary instruction
//! boundaries, so each one widens its mask to every signal before
//! touching the job table or the proc mirror, and diagnostics go through
//! the raw-write `sio` routines rather than buffered stdout.
//!
//! This module also owns the foreground waiter: the one intentional sleep
//! in the shell, built on `sigsuspend` so the check of the wake-up word
//! and the suspension are atomic against the reaper.

use std::io;
use std::sync::atomic::Ordering;

use libc::c_int;
use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, Pid};

use crate::context::{self, ShellContext};
use crate::job::JobState;

/// Install the four handlers. Failure here is fatal for the caller.
pub fn install_handlers() -> nix::Result<()> {
    install(Signal::SIGINT, on_interrupt)?;
    install(Signal::SIGTSTP, on_stop)?;
    install(Signal::SIGCHLD, on_child)?;
    install(Signal::SIGQUIT, on_quit)?;
    Ok(())
}

fn install(sig: Signal, handler: extern "C" fn(c_int)) -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handler),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe { signal::sigaction(sig, &action) }.map(drop)
}

// Mask plumbing. sigprocmask cannot fail with a valid set, so these
// swallow the nominal Result.

/// Block every signal, returning the previous mask.
pub(crate) fn mask_all() -> SigSet {
    let mut prev = SigSet::empty();
    let _ = signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::all()), Some(&mut prev));
    prev
}

pub(crate) fn set_mask(mask: &SigSet) {
    let _ = signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(mask), None);
}

/// A set holding only SIGCHLD, for the fork/record critical section.
pub(crate) fn sigchld_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGCHLD);
    set
}

pub(crate) fn block(set: &SigSet) {
    let _ = signal::sigprocmask(SigmaskHow::SIG_BLOCK, Some(set), None);
}

pub(crate) fn unblock(set: &SigSet) {
    let _ = signal::sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(set), None);
}

/// Block until `pid` has left the foreground.
///
/// The caller must enter with SIGCHLD blocked: the load of `fg_pid` then
/// cannot race the reaper, and `sigsuspend` with an empty mask opens the
/// window atomically and closes it again on return. Any handler that
/// writes the wake-up word can only run while the shell is suspended
/// here.
pub fn wait_fg(ctx: &ShellContext, pid: Pid) {
    let open = SigSet::empty();
    while ctx.fg_pid.load(Ordering::SeqCst) != pid.as_raw() {
        let _ = open.suspend();
    }
    ctx.fg_pid.store(0, Ordering::SeqCst);
}

/// SIGCHLD: reap every ready child, including stopped ones, without
/// blocking. Exits and kills retire the job and its proc record; stops
/// flip the job to `Stopped` and the mirror stat to `T`. Either way the
/// foreground waiter is woken when its job was the one affected.
extern "C" fn on_child(_: c_int) {
    let saved_errno = Errno::last_raw();
    if let Some(ctx) = context::current() {
        let prev = mask_all();
        reap(ctx);
        set_mask(&prev);
    }
    Errno::set_raw(saved_errno);
}

fn reap(ctx: &ShellContext) {
    let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED;
    loop {
        match wait::waitpid(Pid::from_raw(-1), Some(flags)) {
            Ok(WaitStatus::Exited(pid, _)) | Ok(WaitStatus::Signaled(pid, _, _)) => {
                let jobs = unsafe { ctx.jobs_unmasked() };
                let was_fg = jobs
                    .get_by_pid(pid)
                    .is_some_and(|job| job.state == JobState::Foreground);
                let _ = ctx.proc_dir.remove(pid.as_raw());
                jobs.remove(pid);
                if was_fg {
                    ctx.fg_pid.store(pid.as_raw(), Ordering::SeqCst);
                }
                if ctx.verbose {
                    sio_puts("sigchld: reaped ");
                    sio_put_i32(pid.as_raw());
                    sio_puts("\n");
                }
            }
            Ok(WaitStatus::Stopped(pid, _)) => {
                let jobs = unsafe { ctx.jobs_unmasked() };
                if let Some(job) = jobs.get_by_pid_mut(pid) {
                    job.state = JobState::Stopped;
                }
                let _ = ctx.proc_dir.edit_state(pid.as_raw(), "T");
                ctx.fg_pid.store(pid.as_raw(), Ordering::SeqCst);
            }
            _ => break,
        }
    }
}

/// SIGINT: retire the foreground job, wake the waiter, then forward the
/// interrupt to the job's whole process group.
extern "C" fn on_interrupt(_: c_int) {
    let saved_errno = Errno::last_raw();
    if let Some(ctx) = context::current() {
        let prev = mask_all();
        let jobs = unsafe { ctx.jobs_unmasked() };
        if let Some(pid) = jobs.fg_pid() {
            jobs.remove(pid);
            let _ = ctx.proc_dir.remove(pid.as_raw());
            ctx.fg_pid.store(pid.as_raw(), Ordering::SeqCst);
            let _ = signal::kill(Pid::from_raw(-pid.as_raw()), Signal::SIGINT);
        }
        set_mask(&prev);
    }
    Errno::set_raw(saved_errno);
}

/// SIGTSTP: mark the foreground job stopped, mirror the stat, then stop
/// its process group. The waiter is woken by the SIGCHLD that follows.
extern "C" fn on_stop(_: c_int) {
    let saved_errno = Errno::last_raw();
    if let Some(ctx) = context::current() {
        let prev = mask_all();
        let jobs = unsafe { ctx.jobs_unmasked() };
        if let Some(pid) = jobs.fg_pid() {
            if let Some(job) = jobs.get_by_pid_mut(pid) {
                job.state = JobState::Stopped;
            }
            let _ = ctx.proc_dir.edit_state(pid.as_raw(), "T");
            let _ = signal::kill(Pid::from_raw(-pid.as_raw()), Signal::SIGTSTP);
        }
        set_mask(&prev);
    }
    Errno::set_raw(saved_errno);
}

/// SIGQUIT: the driver's kill switch. No shutdown hooks run.
extern "C" fn on_quit(_: c_int) {
    sio_puts("Terminating after receipt of SIGQUIT signal\n");
    std::process::exit(1);
}

// Async-signal-safe output: raw write(2), no locks, no allocation.

pub fn sio_puts(s: &str) {
    let _ = unistd::write(io::stdout(), s.as_bytes());
}

pub fn sio_put_i32(n: i32) {
    let mut buf = [0u8; 12];
    let mut i = buf.len();
    let mut value = i64::from(n);
    let negative = value < 0;
    if negative {
        value = -value;
    }
    loop {
        i -= 1;
        buf[i] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    if negative {
        i -= 1;
        buf[i] = b'-';
    }
    let _ = unistd::write(io::stdout(), &buf[i..]);
}
