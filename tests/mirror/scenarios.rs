// End-to-end scenarios: one tick against small directories

use crate::common::{read, write, Fixture};

#[test]
fn test_copy_into_empty_replica() {
    let fx = Fixture::new();
    write(&fx.source("a.txt"), "hello");

    let report = fx.tick();

    assert_eq!(read(&fx.replica("a.txt")), "hello");
    assert_eq!(report.copied, 1);

    let actions = fx.action_lines();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].contains("Copied"));
    assert!(actions[0].contains("a.txt"));
}

#[test]
fn test_differing_content_is_updated() {
    let fx = Fixture::new();
    write(&fx.source("a.txt"), "hello");
    write(&fx.replica("a.txt"), "world");

    let report = fx.tick();

    assert_eq!(read(&fx.replica("a.txt")), "hello");
    assert_eq!(report.updated, 1);

    let actions = fx.action_lines();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].contains("Updated"));
}

#[test]
fn test_replica_only_file_is_removed() {
    let fx = Fixture::new();
    write(&fx.replica("b.txt"), "stale");

    let report = fx.tick();

    assert!(!fx.replica("b.txt").exists());
    assert_eq!(report.removed, 1);

    let actions = fx.action_lines();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].contains("Removed"));
    assert!(actions[0].contains("b.txt"));
}

#[test]
fn test_identical_files_log_only_brackets() {
    let fx = Fixture::new();
    write(&fx.source("c.txt"), "same bytes");
    write(&fx.replica("c.txt"), "same bytes");

    let report = fx.tick();

    assert_eq!(report.changes(), 0);
    assert_eq!(report.unchanged, 1);
    assert!(fx.action_lines().is_empty());
    // Start marker, separator, finish marker, separator
    assert_eq!(fx.log_lines().len(), 4);
}

#[test]
fn test_log_line_format() {
    let fx = Fixture::new();
    write(&fx.source("a.txt"), "hello");

    fx.tick();

    let lines = fx.log_lines();
    assert!(lines[0].ends_with(" - Starting synchronisation"));
    let (timestamp, _) = lines[0].split_once(" - ").unwrap();
    assert!(chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").is_ok());
    assert!(lines.last().unwrap().chars().all(|c| c == '-'));
}

#[test]
fn test_subdirectory_in_source_is_non_fatal() {
    let fx = Fixture::new();
    std::fs::create_dir(fx.source("nested")).unwrap();
    write(&fx.source("a.txt"), "hello");

    let report = fx.tick();

    assert_eq!(report.copied, 1);
    assert_eq!(report.failed, 1);
    assert!(!fx.replica("nested").exists());

    let actions = fx.action_lines();
    assert!(actions.iter().any(|l| l.contains("Failed to copy") && l.contains("nested")));
    assert!(fx.log_lines().iter().any(|l| l.ends_with("Synchronisation finished")));
}

#[test]
fn test_dry_run_leaves_replica_untouched() {
    let fx = Fixture::new();
    write(&fx.source("a.txt"), "hello");
    write(&fx.replica("b.txt"), "stale");

    let config = fx.config.clone().with_dry_run(true);
    let report = fx.tick_with(&config).unwrap();

    assert_eq!(report.planned, 2);
    assert_eq!(report.changes(), 0);
    assert!(!fx.replica("a.txt").exists());
    assert!(fx.replica("b.txt").exists());

    let actions = fx.action_lines();
    assert!(actions.iter().any(|l| l.contains("Would copy")));
    assert!(actions.iter().any(|l| l.contains("Would remove")));
}

#[test]
fn test_missing_directories_are_created() {
    let fx = Fixture::new();
    std::fs::remove_dir(&fx.config.replica).unwrap();
    write(&fx.source("a.txt"), "hello");

    fx.tick();

    assert_eq!(read(&fx.replica("a.txt")), "hello");
    assert!(fx
        .action_lines()
        .iter()
        .any(|l| l.contains("Created replica directory")));
}

#[cfg(unix)]
#[test]
fn test_unreadable_source_file_is_skipped() {
    use std::fs::{self, File, Permissions};
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    write(&fx.source("locked.txt"), "secret");
    write(&fx.source("ok.txt"), "hello");
    write(&fx.replica("stale.txt"), "stale");
    fs::set_permissions(fx.source("locked.txt"), Permissions::from_mode(0o000)).unwrap();
    if File::open(fx.source("locked.txt")).is_ok() {
        // Running as root: permission bits are not enforced
        return;
    }

    let report = fx.tick();

    assert_eq!(report.failed, 1);
    assert_eq!(report.copied, 1);
    assert_eq!(report.removed, 1);
    assert!(!fx.replica("locked.txt").exists());
    assert_eq!(read(&fx.replica("ok.txt")), "hello");
    assert!(!fx.replica("stale.txt").exists());

    let actions = fx.action_lines();
    assert!(actions
        .iter()
        .any(|l| l.contains("Failed to copy") && l.contains("locked.txt") && l.contains("permission denied")));
    assert!(fx.log_lines().iter().any(|l| l.ends_with("Synchronisation finished")));
}
