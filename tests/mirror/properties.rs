// Properties that must hold after every tick

use dirmirror::hash::HashRegistry;

use crate::common::{assert_converged, names, read, write, Fixture};

#[test]
fn test_converges_from_arbitrary_replica() {
    let fx = Fixture::new();
    write(&fx.source("keep.txt"), "keep");
    write(&fx.source("change.txt"), "new content");
    write(&fx.source("add.txt"), "added");
    write(&fx.source("empty.txt"), "");
    write(&fx.replica("keep.txt"), "keep");
    write(&fx.replica("change.txt"), "old content");
    write(&fx.replica("extra1.txt"), "extra");
    write(&fx.replica("extra2.txt"), "");

    let report = fx.tick();

    assert_eq!(report.copied, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.removed, 2);
    assert_eq!(report.unchanged, 1);
    assert_converged(&fx.config.source, &fx.config.replica);
}

#[test]
fn test_second_tick_is_a_no_op() {
    let fx = Fixture::new();
    write(&fx.source("a.txt"), "hello");
    write(&fx.source("b.txt"), "world");
    write(&fx.replica("c.txt"), "gone soon");

    let first = fx.tick();
    let lines_after_first = fx.action_lines().len();
    let second = fx.tick();

    assert_eq!(first.changes(), 3);
    assert_eq!(second.changes(), 0);
    assert_eq!(second.unchanged, 2);
    assert_eq!(fx.action_lines().len(), lines_after_first);
}

#[test]
fn test_rename_in_source_follows_in_one_tick() {
    let fx = Fixture::new();
    write(&fx.source("a.txt"), "payload");
    fx.tick();

    std::fs::rename(fx.source("a.txt"), fx.source("b.txt")).unwrap();
    let report = fx.tick();

    assert_eq!(report.copied, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(names(&fx.config.replica), vec!["b.txt".to_string()]);
    assert_eq!(read(&fx.replica("b.txt")), "payload");

    // The copy under the new name is logged before the removal of the old one
    let actions = fx.action_lines();
    let copied = actions.iter().rposition(|l| l.contains("Copied") && l.contains("b.txt")).unwrap();
    let removed = actions.iter().rposition(|l| l.contains("Removed") && l.contains("a.txt")).unwrap();
    assert!(copied < removed);
}

#[test]
fn test_same_size_change_is_detected() {
    let fx = Fixture::new();
    write(&fx.source("a.txt"), "aaaa");
    fx.tick();

    // Same length, and the replica copy carries the older mtime already
    write(&fx.source("a.txt"), "bbbb");
    let report = fx.tick();

    assert_eq!(report.updated, 1);
    assert_eq!(read(&fx.replica("a.txt")), "bbbb");
}

#[test]
fn test_log_history_survives_restarts() {
    let fx = Fixture::new();
    write(&fx.source("a.txt"), "hello");

    fx.tick();
    let first_run = fx.log_lines();
    fx.tick();

    let lines = fx.log_lines();
    assert_eq!(&lines[..first_run.len()], &first_run[..]);
    assert_eq!(lines.iter().filter(|l| l.ends_with("Starting synchronisation")).count(), 2);
}

#[test]
fn test_deleted_log_file_is_recreated() {
    let fx = Fixture::new();
    write(&fx.source("a.txt"), "hello");
    fx.tick();

    std::fs::remove_file(&fx.config.log_file).unwrap();
    write(&fx.source("b.txt"), "world");
    fx.tick();

    let actions = fx.action_lines();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].contains("b.txt"));
}

#[test]
fn test_converges_with_every_algorithm() {
    for algorithm in HashRegistry::list_algorithms() {
        let fx = Fixture::new();
        write(&fx.source("a.txt"), "hello");
        write(&fx.replica("a.txt"), "world");
        write(&fx.replica("b.txt"), "extra");

        let config = fx.config.clone().with_algorithm(algorithm);
        fx.tick_with(&config).unwrap();
        let second = fx.tick_with(&config).unwrap();

        assert_converged(&fx.config.source, &fx.config.replica);
        assert_eq!(second.changes(), 0, "{} not idempotent", algorithm);
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_are_mirrored() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = Fixture::new();
    let new_name = OsStr::from_bytes(b"caf\xe9.txt");
    let stale_name = OsStr::from_bytes(b"old\xff.txt");
    std::fs::write(fx.config.source.join(new_name), "latin-1 name").unwrap();
    std::fs::write(fx.config.replica.join(stale_name), "stale").unwrap();

    let report = fx.tick();

    assert_eq!(report.copied, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(report.dropped, 0);
    assert_eq!(read(&fx.config.replica.join(new_name)), "latin-1 name");
    assert!(!fx.config.replica.join(stale_name).exists());

    let actions = fx.action_lines();
    assert!(actions.iter().any(|l| l.contains("Copied \"") && l.contains("caf")));
    assert!(actions.iter().any(|l| l.contains("Removed \"") && l.contains("old")));

    // Converged: the next tick finds nothing to do
    assert_eq!(fx.tick().changes(), 0);
}
