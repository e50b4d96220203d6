//! Property-based testing for fru
//!
//! Uses proptest to verify the change-list invariants across randomly
//! generated tree pairs held in memory.

use ::fru::*;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Strategy for generating tree edits
#[derive(Debug, Clone)]
pub enum TreeOperation {
    File { path: PathBuf, content: Vec<u8> },
    Dir { path: PathBuf },
    Remove { path: PathBuf },
}

/// Short paths over a tiny alphabet, so the two trees collide often
fn path_strategy() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 1..=3)
        .prop_map(|parts| parts.into_iter().collect())
}

/// Tiny contents, so equal files are common
fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(vec![b'x', b'y']), 0..3)
}

fn operation_strategy() -> impl Strategy<Value = TreeOperation> {
    prop_oneof![
        3 => (path_strategy(), content_strategy())
            .prop_map(|(path, content)| TreeOperation::File { path, content }),
        1 => path_strategy().prop_map(|path| TreeOperation::Dir { path }),
        1 => path_strategy().prop_map(|path| TreeOperation::Remove { path }),
    ]
}

fn apply(tree: &mut MemoryTree, ops: &[TreeOperation]) {
    for op in ops {
        match op {
            TreeOperation::File { path, content } => tree.insert_file(path, content.clone()),
            TreeOperation::Dir { path } => tree.insert_dir(path),
            TreeOperation::Remove { path } => {
                tree.remove(path);
            }
        }
    }
}

/// An original tree and an edited copy of it
fn tree_pair_strategy() -> impl Strategy<Value = (MemoryTree, MemoryTree)> {
    (
        prop::collection::vec(operation_strategy(), 0..16),
        prop::collection::vec(operation_strategy(), 0..8),
    )
        .prop_map(|(base, edits)| {
            let mut original = MemoryTree::new();
            apply(&mut original, &base);
            let mut current = original.clone();
            apply(&mut current, &edits);
            (original, current)
        })
}

fn records_with(records: &[ChangeRecord], kind: ChangeKind) -> BTreeSet<PathBuf> {
    records
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| r.path.clone())
        .collect()
}

/// Whether every strict ancestor of `path` is a directory on both sides
fn reachable(original: &MemoryTree, current: &MemoryTree, path: &Path) -> bool {
    path.ancestors().skip(1).all(|ancestor| {
        original.kind_of(ancestor) == Some(EntryKind::Directory)
            && current.kind_of(ancestor) == Some(EntryKind::Directory)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn diff_with_itself_is_empty((tree, _) in tree_pair_strategy()) {
        let records = TreeDiffer::new().diff(&tree, &tree).unwrap();
        prop_assert!(records.is_empty());
    }

    #[test]
    fn additions_mirror_deletions((a, b) in tree_pair_strategy()) {
        let differ = TreeDiffer::new();
        let forward = differ.diff(&a, &b).unwrap();
        let backward = differ.diff(&b, &a).unwrap();

        prop_assert_eq!(
            records_with(&forward, ChangeKind::Added),
            records_with(&backward, ChangeKind::Deleted)
        );
        prop_assert_eq!(
            records_with(&forward, ChangeKind::Deleted),
            records_with(&backward, ChangeKind::Added)
        );
        prop_assert_eq!(
            records_with(&forward, ChangeKind::Modified),
            records_with(&backward, ChangeKind::Modified)
        );
    }

    #[test]
    fn runs_are_deterministic((a, b) in tree_pair_strategy()) {
        let serial = TreeDiffer::new();
        let parallel = TreeDiffer::builder().parallel_workers(3).build().unwrap();

        let first = serial.diff(&a, &b).unwrap();
        prop_assert_eq!(&first, &serial.diff(&a, &b).unwrap());
        prop_assert_eq!(&first, &parallel.diff(&a, &b).unwrap());
    }

    #[test]
    fn records_respect_invariants((a, b) in tree_pair_strategy()) {
        let records = TreeDiffer::new().diff(&a, &b).unwrap();

        let mut seen = BTreeSet::new();
        for record in &records {
            // Each (path, kind) pair appears once.
            prop_assert!(seen.insert((record.path.clone(), record.kind)));
            // Nothing is reported beneath an added or deleted entry.
            prop_assert!(reachable(&a, &b, &record.path));

            let before = a.kind_of(&record.path);
            let after = b.kind_of(&record.path);
            match record.kind {
                ChangeKind::Added => {
                    prop_assert!(after.is_some());
                    prop_assert_ne!(before, after);
                }
                ChangeKind::Deleted => {
                    prop_assert!(before.is_some());
                    prop_assert_ne!(before, after);
                }
                ChangeKind::Modified => {
                    prop_assert_eq!(before, Some(EntryKind::RegularFile));
                    prop_assert_eq!(after, Some(EntryKind::RegularFile));
                    prop_assert_ne!(
                        a.read_all_bytes(&record.path).unwrap(),
                        b.read_all_bytes(&record.path).unwrap()
                    );
                }
            }
        }
    }

    #[test]
    fn every_visible_change_is_reported((a, b) in tree_pair_strategy()) {
        let records = TreeDiffer::new().diff(&a, &b).unwrap();
        let added = records_with(&records, ChangeKind::Added);
        let deleted = records_with(&records, ChangeKind::Deleted);
        let modified = records_with(&records, ChangeKind::Modified);

        let paths: BTreeSet<&Path> = a.paths().chain(b.paths()).collect();
        for path in paths {
            if !reachable(&a, &b, path) {
                continue;
            }
            let before = a.kind_of(path);
            let after = b.kind_of(path);

            prop_assert_eq!(before.is_some() && before != after, deleted.contains(path));
            prop_assert_eq!(after.is_some() && before != after, added.contains(path));

            let changed_file = before == Some(EntryKind::RegularFile)
                && after == Some(EntryKind::RegularFile)
                && a.read_all_bytes(path).unwrap() != b.read_all_bytes(path).unwrap();
            prop_assert_eq!(changed_file, modified.contains(path));
        }
    }
}

#[cfg(test)]
mod edge_case_tests {
    use super::*;

    proptest! {
        /// A vanished directory is one record, however large it was
        #[test]
        fn deleted_directory_is_one_record(
            names in prop::collection::btree_set("[a-z]{1,8}", 1..20)
        ) {
            let mut original = MemoryTree::new().with_file("keep", "k");
            for name in &names {
                original.insert_file(Path::new("tree").join(name).join("leaf"), name.as_bytes());
            }
            let current = MemoryTree::new().with_file("keep", "k");

            let records = TreeDiffer::new().diff(&original, &current).unwrap();
            prop_assert_eq!(records, vec![ChangeRecord::deleted("tree")]);
        }
    }
}
