use dupestash::actions::{gather_duplicates, Archiver, GatherError};
use dupestash::duplicates::{DuplicateFinder, FinderConfig};
use dupestash::error::ErrorCategory;
use dupestash::manifest::{Manifest, MANIFEST_FILE};
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let base = fs::canonicalize(dir.path()).unwrap();
    let tree = base.join("tree");
    fs::create_dir(&tree).unwrap();
    (dir, tree, base.join("archive"))
}

#[test]
fn test_gather_empty_tree() {
    let (_dir, tree, archive) = setup();

    let report = gather_duplicates(&tree, &archive, &DuplicateFinder::with_defaults()).unwrap();

    assert!(report.manifest.is_empty());
    assert_eq!(report.stats.files_seen, 0);
    assert_eq!(report.archive_dir, archive);
    assert!(archive.join(MANIFEST_FILE).is_file());
}

#[test]
fn test_gather_slots_follow_discovery_order() {
    let (_dir, tree, archive) = setup();
    fs::write(tree.join("a1"), "one").unwrap();
    fs::write(tree.join("b1"), "two").unwrap();
    fs::write(tree.join("c2"), "two").unwrap();
    fs::write(tree.join("d2"), "one").unwrap();
    fs::write(tree.join("e3"), "one").unwrap();

    let report = gather_duplicates(&tree, &archive, &DuplicateFinder::with_defaults()).unwrap();

    let expected = ["c2", "d2", "e3"].map(|n| tree.join(n));
    let actual: Vec<PathBuf> = report
        .manifest
        .iter()
        .map(|r| r.original_path.clone())
        .collect();
    assert_eq!(actual, expected);
    assert_eq!(fs::read(archive.join("0")).unwrap(), b"two");
    assert_eq!(fs::read(archive.join("1")).unwrap(), b"one");
    assert_eq!(fs::read(archive.join("2")).unwrap(), b"one");
    assert_eq!(report.stats.duplicate_bytes, 9);
}

#[test]
fn test_gather_manifest_lines_are_absolute_paths() {
    let (_dir, tree, archive) = setup();
    fs::write(tree.join("x"), "dup").unwrap();
    fs::write(tree.join("y with space"), "dup").unwrap();

    gather_duplicates(&tree, &archive, &DuplicateFinder::with_defaults()).unwrap();

    let text = fs::read_to_string(archive.join(MANIFEST_FILE)).unwrap();
    assert_eq!(
        text,
        format!("{}\n", tree.join("y with space").to_str().unwrap())
    );
}

#[test]
fn test_gather_root_with_dot_dot() {
    let (_dir, tree, archive) = setup();
    fs::create_dir(tree.join("inner")).unwrap();
    fs::write(tree.join("inner").join("a"), "dup").unwrap();
    fs::write(tree.join("inner").join("b"), "dup").unwrap();
    let indirect = tree.join("inner").join("..").join("inner");

    let report =
        gather_duplicates(&indirect, &archive, &DuplicateFinder::with_defaults()).unwrap();

    assert_eq!(
        report.manifest.records()[0].original_path,
        tree.join("inner").join("b")
    );
}

#[test]
fn test_gather_large_files_paranoid() {
    let (_dir, tree, archive) = setup();
    let body: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    fs::write(tree.join("big1"), &body).unwrap();
    fs::write(tree.join("big2"), &body).unwrap();
    let mut other = body.clone();
    other[99_999] ^= 1;
    fs::write(tree.join("big3"), &other).unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_paranoid(true));
    let report = gather_duplicates(&tree, &archive, &finder).unwrap();

    assert_eq!(report.manifest.len(), 1);
    assert_eq!(report.manifest.records()[0].original_path, tree.join("big2"));
    assert!(tree.join("big3").exists());
}

#[test]
fn test_gather_small_prehash_size() {
    let (_dir, tree, archive) = setup();
    fs::write(tree.join("a"), "abcdefgh").unwrap();
    fs::write(tree.join("b"), "abcdXXXX").unwrap();
    fs::write(tree.join("c"), "abcdefgh").unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_prehash_size(4));
    let report = gather_duplicates(&tree, &archive, &finder).unwrap();

    assert_eq!(report.manifest.len(), 1);
    assert_eq!(report.manifest.records()[0].original_path, tree.join("c"));
}

#[test]
fn test_target_that_is_a_file_is_refused() {
    let (_dir, tree, archive) = setup();
    fs::write(&archive, "not a directory").unwrap();

    let err = Archiver::new(&tree, &archive).unwrap_err();

    assert!(matches!(err, GatherError::Conflict { .. }));
    assert_eq!(fs::read(&archive).unwrap(), b"not a directory");
}

#[test]
fn test_archive_outside_tree_with_shared_prefix_is_allowed() {
    let (_dir, tree, _archive) = setup();
    let sibling = tree.with_file_name("tree-dupes");

    assert!(Archiver::new(&tree, &sibling).is_ok());
}

#[test]
fn test_gather_twice_into_same_archive_is_refused() {
    let (_dir, tree, archive) = setup();
    fs::write(tree.join("a"), "dup").unwrap();
    fs::write(tree.join("b"), "dup").unwrap();
    fs::write(tree.join("c"), "dup").unwrap();
    let finder = DuplicateFinder::with_defaults();
    gather_duplicates(&tree, &archive, &finder).unwrap();

    let err = gather_duplicates(&tree, &archive, &finder).unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Conflict);
    assert_eq!(Manifest::read_from(&archive).unwrap().len(), 2);
}

#[cfg(unix)]
#[test]
fn test_failed_move_rolls_back() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, tree, archive) = setup();
    let locked = tree.join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(tree.join("a"), "dup").unwrap();
    fs::write(tree.join("b"), "dup").unwrap();
    fs::write(locked.join("c"), "dup").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Root ignores directory permissions.
    let check = locked.join("check");
    if fs::write(&check, "").is_ok() {
        fs::remove_file(&check).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let err = gather_duplicates(&tree, &archive, &DuplicateFinder::with_defaults()).unwrap_err();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(err, GatherError::Move { .. }));
    assert_eq!(err.category(), ErrorCategory::Io);
    assert_eq!(fs::read(tree.join("b")).unwrap(), b"dup");
    assert_eq!(fs::read(locked.join("c")).unwrap(), b"dup");
    assert!(!archive.exists());
}
