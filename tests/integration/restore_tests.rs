use dupestash::actions::{gather_duplicates, restore, RestoreError, Restorer};
use dupestash::duplicates::DuplicateFinder;
use dupestash::error::ErrorCategory;
use dupestash::manifest::{Manifest, MANIFEST_FILE};
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Gather a tree holding `a`, `b` (copy of a), `sub/c` (copy of a), `d`.
fn gathered() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let base = fs::canonicalize(dir.path()).unwrap();
    let tree = base.join("tree");
    fs::create_dir_all(tree.join("sub")).unwrap();
    fs::write(tree.join("a"), "copy").unwrap();
    fs::write(tree.join("b"), "copy").unwrap();
    fs::write(tree.join("sub").join("c"), "copy").unwrap();
    fs::write(tree.join("d"), "unique").unwrap();
    let archive = base.join("archive");
    gather_duplicates(&tree, &archive, &DuplicateFinder::with_defaults()).unwrap();
    (dir, tree, archive)
}

#[test]
fn test_restore_after_gather() {
    let (_dir, tree, archive) = gathered();
    assert!(!tree.join("b").exists());
    assert!(!tree.join("sub").join("c").exists());

    assert_eq!(restore(&archive).unwrap(), 2);

    assert_eq!(fs::read(tree.join("b")).unwrap(), b"copy");
    assert_eq!(fs::read(tree.join("sub").join("c")).unwrap(), b"copy");
    assert_eq!(fs::read(tree.join("d")).unwrap(), b"unique");
    assert!(!archive.exists());
}

#[test]
fn test_restore_twice_fails_not_found() {
    let (_dir, _tree, archive) = gathered();
    restore(&archive).unwrap();

    let err = restore(&archive).unwrap_err();

    assert_eq!(err.category(), ErrorCategory::NotFound);
}

#[test]
fn test_load_manifest_does_not_move_anything() {
    let (_dir, tree, archive) = gathered();
    let restorer = Restorer::new(&archive);

    let manifest = restorer.load_manifest().unwrap();

    assert_eq!(manifest.len(), 2);
    assert_eq!(restorer.archive_dir(), archive.as_path());
    assert!(!tree.join("b").exists());
    assert!(archive.join("1").exists());
}

#[test]
fn test_truncated_manifest_is_refused() {
    let (_dir, tree, archive) = gathered();
    fs::write(archive.join(MANIFEST_FILE), "\n").unwrap();

    let err = restore(&archive).unwrap_err();

    assert!(matches!(err, RestoreError::Manifest(_)));
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert!(!tree.join("b").exists());
    assert!(archive.join("0").exists());
}

#[test]
fn test_edited_manifest_is_honoured() {
    let (_dir, tree, archive) = gathered();
    let manifest = Manifest::read_from(&archive).unwrap();
    let renamed = tree.join("renamed");
    let edited = Manifest::from_originals(
        manifest
            .iter()
            .enumerate()
            .map(|(i, r)| if i == 0 { renamed.clone() } else { r.original_path.clone() }),
    );
    edited.write_to(&archive).unwrap();

    restore(&archive).unwrap();

    assert_eq!(fs::read(&renamed).unwrap(), b"copy");
    assert!(!tree.join("b").exists());
    assert!(tree.join("sub").join("c").exists());
}

#[test]
fn test_occupied_destination_leaves_archive_intact() {
    let (_dir, tree, archive) = gathered();
    fs::write(tree.join("sub").join("c"), "recreated").unwrap();

    let err = restore(&archive).unwrap_err();

    assert!(matches!(err, RestoreError::DestinationExists { slot: 1, .. }));
    assert!(!tree.join("b").exists());
    assert_eq!(fs::read(tree.join("sub").join("c")).unwrap(), b"recreated");
    assert_eq!(Manifest::read_from(&archive).unwrap().len(), 2);
}

#[test]
fn test_removed_parent_stops_after_earlier_slots() {
    let (_dir, tree, archive) = gathered();
    fs::remove_dir(tree.join("sub")).unwrap();

    let err = restore(&archive).unwrap_err();

    assert!(matches!(err, RestoreError::Move { slot: 1, .. }));
    assert_eq!(err.category(), ErrorCategory::Io);
    assert!(tree.join("b").exists());
    assert!(archive.join("1").exists());
    assert!(!archive.join("0").exists());
}

#[test]
fn test_extra_files_in_archive_are_removed() {
    let (_dir, tree, archive) = gathered();
    fs::write(archive.join("notes"), "scratch").unwrap();

    restore(&archive).unwrap();

    assert!(!archive.exists());
    assert!(tree.join("b").exists());
}

#[test]
fn test_restore_resumes_after_parent_is_recreated() {
    let (_dir, tree, archive) = gathered();
    fs::remove_dir(tree.join("sub")).unwrap();
    restore(&archive).unwrap_err();
    fs::create_dir(tree.join("sub")).unwrap();

    assert_eq!(restore(&archive).unwrap(), 1);

    assert_eq!(fs::read(tree.join("b")).unwrap(), b"copy");
    assert_eq!(fs::read(tree.join("sub").join("c")).unwrap(), b"copy");
    assert!(!archive.exists());
}

#[cfg(unix)]
#[test]
fn test_restore_through_symlink_removes_real_archive() {
    let (dir, tree, archive) = gathered();
    let alias = dir.path().join("alias");
    std::os::unix::fs::symlink(&archive, &alias).unwrap();

    assert_eq!(restore(&alias).unwrap(), 2);

    assert!(tree.join("b").exists());
    assert!(!archive.exists());
    assert!(fs::symlink_metadata(&alias).is_err());
}
