//! The process-wide shell context shared with the signal handlers.
//!
//! Everything the handlers need lives in one owning value: the logged-in
//! identity, the job table, the foreground wake-up word and the proc
//! mirror handle. The value is leaked to `'static` and published through
//! an atomic pointer once login completes; until then the handlers see
//! null and return without touching anything (no child can exist yet).
//!
//! Sharing discipline: `fg_pid` is a lock-free atomic; the job table is
//! guarded by signal masking. Main-thread access goes through
//! [`ShellContext::with_jobs`], which holds a full mask for the duration;
//! handlers widen their own mask and then use
//! [`ShellContext::jobs_unmasked`].

use std::cell::UnsafeCell;
use std::path::PathBuf;
use std::ptr;
use std::sync::atomic::{AtomicI32, AtomicPtr, Ordering};

use nix::unistd::Pid;

use crate::job::JobTable;
use crate::procfs::ProcDir;
use crate::signals;

pub struct ShellContext {
    /// Name of the user logged into the shell.
    pub username: String,
    /// That user's home directory.
    pub home: PathBuf,
    /// The shell's own pid, recorded once at startup; children carry it
    /// as their session id in the proc mirror.
    pub sid: Pid,
    pub verbose: bool,
    /// Wake-up word for the foreground waiter: 0 while the foreground job
    /// runs, its pid once it has left the foreground.
    pub fg_pid: AtomicI32,
    pub proc_dir: ProcDir,
    jobs: UnsafeCell<JobTable>,
}

// One OS thread plus signal handlers; the masking discipline above
// serializes every access to `jobs`.
unsafe impl Sync for ShellContext {}

static CONTEXT: AtomicPtr<ShellContext> = AtomicPtr::new(ptr::null_mut());

impl ShellContext {
    pub fn new(
        username: String,
        home: PathBuf,
        sid: Pid,
        verbose: bool,
        jobs: JobTable,
        proc_dir: ProcDir,
    ) -> Self {
        ShellContext {
            username,
            home,
            sid,
            verbose,
            fg_pid: AtomicI32::new(0),
            proc_dir,
            jobs: UnsafeCell::new(jobs),
        }
    }

    /// Run `f` on the job table with every signal blocked, so no handler
    /// can observe a half-applied mutation. Reads go through here too: a
    /// handler rewriting a slot mid-listing would be just as bad.
    pub fn with_jobs<R>(&self, f: impl FnOnce(&mut JobTable) -> R) -> R {
        let prev = signals::mask_all();
        let result = f(unsafe { &mut *self.jobs.get() });
        signals::set_mask(&prev);
        result
    }

    /// Job table access without taking a mask.
    ///
    /// # Safety
    ///
    /// Only call from a signal handler that has already widened its mask
    /// to all signals. Anywhere else, use [`ShellContext::with_jobs`].
    pub unsafe fn jobs_unmasked(&self) -> &mut JobTable {
        &mut *self.jobs.get()
    }
}

/// Publish the context for the signal handlers. Call once, after login
/// and before the first fork.
pub fn install(ctx: ShellContext) -> &'static ShellContext {
    let leaked: &'static ShellContext = Box::leak(Box::new(ctx));
    CONTEXT.store(leaked as *const ShellContext as *mut ShellContext, Ordering::SeqCst);
    leaked
}

/// The installed context, or `None` before login has completed.
pub fn current() -> Option<&'static ShellContext> {
    let ptr = CONTEXT.load(Ordering::SeqCst);
    unsafe { ptr.as_ref() }
}
