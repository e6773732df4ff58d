//! Behavior of the simulated proc tree.

use std::fs;

use tsh::procfs::{ProcDir, ProcError, ProcRecord};

mod common;
use common::Scratch;

fn record(pid: i32, stat: &str) -> ProcRecord {
    ProcRecord {
        name: "sleep".to_string(),
        pid,
        ppid: 1000,
        pgid: pid,
        sid: 1000,
        stat: stat.to_string(),
        username: "alice".to_string(),
    }
}

#[test]
fn write_then_read_returns_the_same_record() {
    let scratch = Scratch::new("proc_rw");
    let proc_dir = ProcDir::new(scratch.path("proc"));

    let rec = record(4321, "R+");
    proc_dir.write(&rec).unwrap();
    assert_eq!(proc_dir.read(4321).unwrap(), rec);
}

#[test]
fn status_file_has_seven_labeled_lines() {
    let scratch = Scratch::new("proc_layout");
    let proc_dir = ProcDir::new(scratch.path("proc"));
    proc_dir.write(&record(7, "T")).unwrap();

    let text = fs::read_to_string(scratch.path("proc/7/status")).unwrap();
    let labels: Vec<&str> = text
        .lines()
        .filter_map(|l| l.split(':').next())
        .collect();
    assert_eq!(
        labels,
        vec!["Name", "Pid", "PPid", "PGid", "Sid", "STAT", "Username"]
    );
    assert!(text.contains("STAT:\tT\n"));
}

#[test]
fn edit_state_changes_only_the_stat_field() {
    let scratch = Scratch::new("proc_edit");
    let proc_dir = ProcDir::new(scratch.path("proc"));
    proc_dir.write(&record(99, "R")).unwrap();

    proc_dir.edit_state(99, "T").unwrap();
    let after = proc_dir.read(99).unwrap();
    assert_eq!(after.stat, "T");
    assert_eq!(after.name, "sleep");
    assert_eq!(after.pgid, 99);
}

#[test]
fn edit_state_on_a_deleted_record_reports_missing() {
    let scratch = Scratch::new("proc_missing");
    let proc_dir = ProcDir::new(scratch.path("proc"));
    let err = proc_dir.edit_state(12345, "R").unwrap_err();
    assert!(matches!(err, ProcError::Missing(12345)));
}

#[test]
fn remove_deletes_the_whole_pid_entry() {
    let scratch = Scratch::new("proc_remove");
    let proc_dir = ProcDir::new(scratch.path("proc"));
    proc_dir.write(&record(55, "R")).unwrap();

    proc_dir.remove(55).unwrap();
    assert!(!scratch.path("proc/55").exists());
    assert!(matches!(proc_dir.read(55), Err(ProcError::Missing(55))));
    assert!(matches!(proc_dir.remove(55), Err(ProcError::Missing(55))));
}

#[test]
fn remove_all_purges_numeric_entries_only() {
    let scratch = Scratch::new("proc_purge");
    let proc_dir = ProcDir::new(scratch.path("proc"));
    // Live records plus an orphan left by a "crashed" earlier run.
    proc_dir.write(&record(10, "R")).unwrap();
    proc_dir.write(&record(11, "T")).unwrap();
    proc_dir.write(&record(99999, "R")).unwrap();
    fs::create_dir_all(scratch.path("proc/not-a-pid")).unwrap();

    proc_dir.remove_all().unwrap();
    assert!(!scratch.path("proc/10").exists());
    assert!(!scratch.path("proc/11").exists());
    assert!(!scratch.path("proc/99999").exists());
    assert!(scratch.path("proc/not-a-pid").exists());
}

#[test]
fn remove_all_tolerates_a_missing_root() {
    let scratch = Scratch::new("proc_no_root");
    let proc_dir = ProcDir::new(scratch.path("proc"));
    proc_dir.remove_all().unwrap();
}
