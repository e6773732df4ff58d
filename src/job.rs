//! The job table: bounded bookkeeping for the shell's children.
//!
//! A fixed array of slots, one per tracked child. Job ids are handed out
//! monotonically and wrap back to 1 once the ceiling is reached; after a
//! removal the counter snaps to `max(jid) + 1` over the surviving slots.
//!
//! The table itself is not synchronized. All main-thread access runs under
//! a full signal mask (`ShellContext::with_jobs`); signal handlers widen
//! their own mask before touching it.

use nix::unistd::Pid;

/// Maximum number of jobs tracked at any point in time.
pub const MAX_JOBS: usize = 16;

/// What a tracked child is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Empty slot.
    Undefined,
    /// Running and owning the terminal; the shell is waiting on it.
    Foreground,
    /// Running without the shell waiting.
    Background,
    /// Paused by a stop signal, resumable with SIGCONT.
    Stopped,
}

impl JobState {
    /// The word `jobs` prints for this state.
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Undefined => "Undefined",
            JobState::Foreground => "Foreground",
            JobState::Background => "Running",
            JobState::Stopped => "Stopped",
        }
    }

    /// Proc mirror stat code for a child in this state.
    pub fn stat_code(self) -> &'static str {
        match self {
            JobState::Undefined => "?",
            JobState::Foreground => "R+",
            JobState::Background => "R",
            JobState::Stopped => "T",
        }
    }
}

/// One slot in the job table.
#[derive(Debug, Clone)]
pub struct Job {
    pub pid: Pid,
    pub jid: i32,
    pub state: JobState,
    pub cmdline: String,
}

impl Job {
    fn empty() -> Self {
        Job {
            pid: Pid::from_raw(0),
            jid: 0,
            state: JobState::Undefined,
            cmdline: String::new(),
        }
    }

    fn clear(&mut self) {
        self.pid = Pid::from_raw(0);
        self.jid = 0;
        self.state = JobState::Undefined;
        self.cmdline.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pid.as_raw() == 0
    }
}

/// The process-wide job list.
pub struct JobTable {
    jobs: [Job; MAX_JOBS],
    next_jid: i32,
    verbose: bool,
}

impl JobTable {
    pub fn new(verbose: bool) -> Self {
        JobTable {
            jobs: std::array::from_fn(|_| Job::empty()),
            next_jid: 1,
            verbose,
        }
    }

    /// Insert a child into the first empty slot. Returns false when the
    /// table is full or the pid is not a real child pid.
    pub fn add(&mut self, pid: Pid, state: JobState, cmdline: &str) -> bool {
        if pid.as_raw() < 1 {
            return false;
        }
        for job in &mut self.jobs {
            if job.is_empty() {
                job.pid = pid;
                job.state = state;
                job.jid = self.next_jid;
                self.next_jid += 1;
                if self.next_jid > MAX_JOBS as i32 {
                    self.next_jid = 1;
                }
                job.cmdline = cmdline.to_string();
                if self.verbose {
                    println!("Added job [{}] {} {}", job.jid, job.pid, job.cmdline);
                }
                return true;
            }
        }
        println!("Tried to create too many jobs");
        false
    }

    /// Clear the slot holding `pid` and snap the jid counter to
    /// `max(jid) + 1`.
    pub fn remove(&mut self, pid: Pid) -> bool {
        if pid.as_raw() < 1 {
            return false;
        }
        for job in &mut self.jobs {
            if job.pid == pid {
                job.clear();
                self.next_jid = self.max_jid() + 1;
                return true;
            }
        }
        false
    }

    fn max_jid(&self) -> i32 {
        self.jobs.iter().map(|j| j.jid).max().unwrap_or(0)
    }

    pub fn get_by_pid(&self, pid: Pid) -> Option<&Job> {
        if pid.as_raw() < 1 {
            return None;
        }
        self.jobs.iter().find(|j| j.pid == pid)
    }

    pub fn get_by_pid_mut(&mut self, pid: Pid) -> Option<&mut Job> {
        if pid.as_raw() < 1 {
            return None;
        }
        self.jobs.iter_mut().find(|j| j.pid == pid)
    }

    pub fn get_by_jid(&self, jid: i32) -> Option<&Job> {
        if jid < 1 {
            return None;
        }
        self.jobs.iter().find(|j| !j.is_empty() && j.jid == jid)
    }

    /// Pid of the unique foreground job, if one exists.
    pub fn fg_pid(&self) -> Option<Pid> {
        self.jobs
            .iter()
            .find(|j| j.state == JobState::Foreground)
            .map(|j| j.pid)
    }

    /// Map a pid to its jid; 0 when no slot holds that pid.
    pub fn pid_to_jid(&self, pid: Pid) -> i32 {
        self.get_by_pid(pid).map(|j| j.jid).unwrap_or(0)
    }

    /// True while any slot is occupied. `logout` refuses to exit then.
    pub fn any_open(&self) -> bool {
        self.jobs.iter().any(|j| j.state != JobState::Undefined)
    }

    /// Print the table in slot order, one line per occupied slot.
    pub fn list(&self) {
        for job in &self.jobs {
            if !job.is_empty() {
                println!(
                    "[{}] ({}) {} {}",
                    job.jid,
                    job.pid,
                    job.state.as_str(),
                    job.cmdline
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: i32) -> Pid {
        Pid::from_raw(raw)
    }

    #[test]
    fn add_assigns_sequential_jids() {
        let mut table = JobTable::new(false);
        assert!(table.add(pid(100), JobState::Background, "sleep 1 &"));
        assert!(table.add(pid(101), JobState::Background, "sleep 2 &"));
        assert_eq!(table.get_by_pid(pid(100)).unwrap().jid, 1);
        assert_eq!(table.get_by_pid(pid(101)).unwrap().jid, 2);
    }

    #[test]
    fn add_rejects_non_positive_pid() {
        let mut table = JobTable::new(false);
        assert!(!table.add(pid(0), JobState::Background, "x"));
        assert!(!table.add(pid(-3), JobState::Background, "x"));
        assert!(!table.any_open());
    }

    #[test]
    fn table_is_bounded() {
        let mut table = JobTable::new(false);
        for i in 0..MAX_JOBS as i32 {
            assert!(table.add(pid(100 + i), JobState::Background, "job"));
        }
        assert!(!table.add(pid(999), JobState::Background, "one too many"));
    }

    #[test]
    fn remove_resets_next_jid_to_max_plus_one() {
        let mut table = JobTable::new(false);
        table.add(pid(100), JobState::Background, "a");
        table.add(pid(101), JobState::Background, "b");
        table.add(pid(102), JobState::Background, "c");
        assert!(table.remove(pid(102)));
        // Remaining max jid is 2, so the next add gets 3 again.
        table.add(pid(103), JobState::Background, "d");
        assert_eq!(table.get_by_pid(pid(103)).unwrap().jid, 3);
    }

    #[test]
    fn remove_unknown_pid_is_reported() {
        let mut table = JobTable::new(false);
        table.add(pid(100), JobState::Background, "a");
        assert!(!table.remove(pid(777)));
        assert!(table.any_open());
    }

    #[test]
    fn fg_pid_finds_the_foreground_slot() {
        let mut table = JobTable::new(false);
        table.add(pid(100), JobState::Background, "bg job &");
        assert_eq!(table.fg_pid(), None);
        table.add(pid(101), JobState::Foreground, "fg job");
        assert_eq!(table.fg_pid(), Some(pid(101)));
        table.remove(pid(101));
        assert_eq!(table.fg_pid(), None);
    }

    #[test]
    fn pid_to_jid_is_zero_for_unknown_pids() {
        let mut table = JobTable::new(false);
        table.add(pid(100), JobState::Stopped, "cat");
        assert_eq!(table.pid_to_jid(pid(100)), 1);
        assert_eq!(table.pid_to_jid(pid(200)), 0);
        assert_eq!(table.pid_to_jid(pid(0)), 0);
    }

    #[test]
    fn jid_lookup_ignores_empty_slots() {
        let mut table = JobTable::new(false);
        assert!(table.get_by_jid(0).is_none());
        assert!(table.get_by_jid(1).is_none());
        table.add(pid(100), JobState::Background, "a");
        assert_eq!(table.get_by_jid(1).unwrap().pid, pid(100));
    }

    #[test]
    fn jid_allocation_wraps_at_the_ceiling() {
        let mut table = JobTable::new(false);
        for i in 0..MAX_JOBS as i32 {
            table.add(pid(100 + i), JobState::Background, "job");
        }
        // Everything removed in turn; the counter wrapped to 1 after the
        // 16th add and each removal snaps it back to max + 1.
        for i in 0..MAX_JOBS as i32 {
            table.remove(pid(100 + i));
        }
        assert!(!table.any_open());
        table.add(pid(500), JobState::Background, "fresh");
        assert_eq!(table.get_by_pid(pid(500)).unwrap().jid, 1);
    }
}
