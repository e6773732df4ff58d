//! The simulated proc tree: one `proc/<pid>/status` file per known process.
//!
//! The mirror is an external sink keyed by pid; it owns no in-memory state,
//! so a record can disappear underneath any caller (the reaper may have run
//! between a read and a write). Every operation reports `Missing` for that
//! case instead of failing hard.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcError {
    #[error("no status record for pid {0}")]
    Missing(i32),
    #[error("malformed status record: {0}")]
    Malformed(String),
    #[error("proc mirror I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The seven fields of a status record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcRecord {
    pub name: String,
    pub pid: i32,
    pub ppid: i32,
    pub pgid: i32,
    pub sid: i32,
    /// `Ss` session leader, `R` running in BG, `R+` running in FG,
    /// `T` stopped.
    pub stat: String,
    pub username: String,
}

impl ProcRecord {
    fn render(&self) -> String {
        format!(
            "Name:\t{}\nPid:\t{}\nPPid:\t{}\nPGid:\t{}\nSid:\t{}\nSTAT:\t{}\nUsername:\t{}\n",
            self.name, self.pid, self.ppid, self.pgid, self.sid, self.stat, self.username
        )
    }

    fn parse(text: &str) -> Result<ProcRecord, ProcError> {
        let mut fields = [None::<&str>; 7];
        const LABELS: [&str; 7] = ["Name", "Pid", "PPid", "PGid", "Sid", "STAT", "Username"];
        for line in text.lines() {
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            if let Some(slot) = LABELS.iter().position(|&l| l == label) {
                fields[slot] = Some(value.trim());
            }
        }
        let field = |i: usize| {
            fields[i].ok_or_else(|| ProcError::Malformed(format!("missing {} line", LABELS[i])))
        };
        let number = |i: usize| -> Result<i32, ProcError> {
            field(i)?
                .parse()
                .map_err(|_| ProcError::Malformed(format!("bad {} value", LABELS[i])))
        };
        Ok(ProcRecord {
            name: field(0)?.to_string(),
            pid: number(1)?,
            ppid: number(2)?,
            pgid: number(3)?,
            sid: number(4)?,
            stat: field(5)?.to_string(),
            username: field(6)?.to_string(),
        })
    }
}

/// Handle on the mirror's root directory.
#[derive(Debug, Clone)]
pub struct ProcDir {
    root: PathBuf,
}

impl ProcDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProcDir { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn status_path(&self, pid: i32) -> PathBuf {
        self.root.join(pid.to_string()).join("status")
    }

    /// Create or replace the record for `record.pid`.
    pub fn write(&self, record: &ProcRecord) -> Result<(), ProcError> {
        let path = self.status_path(record.pid);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, record.render())?;
        Ok(())
    }

    pub fn read(&self, pid: i32) -> Result<ProcRecord, ProcError> {
        match fs::read_to_string(self.status_path(pid)) {
            Ok(text) => ProcRecord::parse(&text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ProcError::Missing(pid)),
            Err(err) => Err(err.into()),
        }
    }

    /// Read-modify-write of the stat field alone. A record deleted by a
    /// concurrent reap surfaces as `Missing`.
    pub fn edit_state(&self, pid: i32, stat: &str) -> Result<(), ProcError> {
        let mut record = self.read(pid)?;
        record.stat = stat.to_string();
        self.write(&record)
    }

    pub fn remove(&self, pid: i32) -> Result<(), ProcError> {
        match fs::remove_dir_all(self.root.join(pid.to_string())) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ProcError::Missing(pid)),
            Err(err) => Err(err.into()),
        }
    }

    /// Purge every numeric entry under the root. Covers the shell's own
    /// children and any orphans an earlier crashed run left behind.
    pub fn remove_all(&self) -> Result<(), ProcError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        for entry in entries {
            let entry = entry?;
            let is_numeric = entry
                .file_name()
                .to_str()
                .is_some_and(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()));
            if is_numeric {
                fs::remove_dir_all(entry.path())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_and_parse_round_trip() {
        let record = ProcRecord {
            name: "cat".to_string(),
            pid: 4242,
            ppid: 4200,
            pgid: 4242,
            sid: 4200,
            stat: "R+".to_string(),
            username: "root".to_string(),
        };
        let parsed = ProcRecord::parse(&record.render()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn parse_rejects_truncated_records() {
        let err = ProcRecord::parse("Name:\tcat\nPid:\t1\n").unwrap_err();
        assert!(matches!(err, ProcError::Malformed(_)));
    }

    #[test]
    fn parse_rejects_non_numeric_pid() {
        let text = "Name:\tcat\nPid:\tx\nPPid:\t1\nPGid:\t1\nSid:\t1\nSTAT:\tR\nUsername:\tu\n";
        let err = ProcRecord::parse(text).unwrap_err();
        assert!(matches!(err, ProcError::Malformed(_)));
    }
}
