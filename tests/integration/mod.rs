//! Integration tests for fru over generated directory trees
//!
//! Builds project-like trees on disk, mutates a copy of them, and checks the
//! differ against an in-memory mirror of both trees.

use ::fru::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;
use walkdir::WalkDir;

/// Test harness holding an original tree and a current copy of it
pub struct DiffTestHarness {
    pub original_dir: TempDir,
    pub current_dir: TempDir,
    pub rng: StdRng,
    pub operation_log: Vec<TestOperation>,
}

#[derive(Debug, Clone)]
pub enum TestOperation {
    ModifyFile { path: PathBuf },
    CreateFile { path: PathBuf },
    DeletePath { path: PathBuf },
    FileToDirectory { path: PathBuf },
}

/// Shape of a generated project
pub struct ProjectConfig {
    pub max_depth: usize,
    pub dirs_per_level: usize,
    pub files_per_dir: usize,
    pub file_size_range: Range<usize>,
}

impl DiffTestHarness {
    /// Create a new test harness
    pub fn new(seed: u64) -> Self {
        Self {
            original_dir: TempDir::new().unwrap(),
            current_dir: TempDir::new().unwrap(),
            rng: StdRng::seed_from_u64(seed),
            operation_log: Vec::new(),
        }
    }

    /// Generate the same project in both trees
    pub fn generate_project(&mut self, config: &ProjectConfig) -> anyhow::Result<()> {
        let root = self.original_dir.path().to_path_buf();
        self.generate_level(&root, config, 0)?;
        copy_tree(self.original_dir.path(), self.current_dir.path())?;
        Ok(())
    }

    fn generate_level(&mut self, dir: &Path, config: &ProjectConfig, depth: usize) -> anyhow::Result<()> {
        for i in 0..config.files_per_dir {
            let size = self.rng.random_range(config.file_size_range.clone());
            let content: Vec<u8> = (0..size).map(|_| self.rng.random()).collect();
            fs::write(dir.join(format!("file_{}.dat", i)), content)?;
        }

        if depth < config.max_depth {
            for i in 0..config.dirs_per_level {
                let sub = dir.join(format!("dir_{}", i));
                fs::create_dir(&sub)?;
                self.generate_level(&sub, config, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Apply random mutations to the current tree
    pub fn mutate(&mut self, count: usize) -> anyhow::Result<()> {
        for _ in 0..count {
            let files = list_files(self.current_dir.path())?;
            if files.is_empty() {
                break;
            }
            let path = files[self.rng.random_range(0..files.len())].clone();
            let full = self.current_dir.path().join(&path);

            let op = match self.rng.random_range(0..4) {
                0 => {
                    let mut content = fs::read(&full)?;
                    content.push(self.rng.random());
                    fs::write(&full, content)?;
                    TestOperation::ModifyFile { path }
                }
                1 => {
                    let new_path = path.with_extension(format!("new{}", self.rng.random::<u16>()));
                    fs::write(self.current_dir.path().join(&new_path), b"fresh")?;
                    TestOperation::CreateFile { path: new_path }
                }
                2 => {
                    fs::remove_file(&full)?;
                    TestOperation::DeletePath { path }
                }
                _ => {
                    fs::remove_file(&full)?;
                    fs::create_dir(&full)?;
                    fs::write(full.join("inner.txt"), b"inner")?;
                    TestOperation::FileToDirectory { path }
                }
            };
            self.operation_log.push(op);
        }
        Ok(())
    }

    pub fn original(&self) -> FsTree {
        FsTree::open(self.original_dir.path()).unwrap()
    }

    pub fn current(&self) -> FsTree {
        FsTree::open(self.current_dir.path()).unwrap()
    }
}

/// Copy a directory tree of regular files and directories
pub fn copy_tree(from: &Path, to: &Path) -> anyhow::Result<()> {
    for entry in WalkDir::new(from).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let target = to.join(entry.path().strip_prefix(from)?);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Relative paths of all regular files
pub fn list_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().strip_prefix(root)?.to_path_buf());
        }
    }
    Ok(files)
}

/// Mirror a directory on disk into a memory tree
pub fn load_memory_tree(root: &Path) -> anyhow::Result<MemoryTree> {
    let mut tree = MemoryTree::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(root)?;
        if entry.file_type().is_dir() {
            tree.insert_dir(relative);
        } else {
            tree.insert_file(relative, fs::read(entry.path())?);
        }
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn small_project() -> ProjectConfig {
        ProjectConfig {
            max_depth: 2,
            dirs_per_level: 3,
            files_per_dir: 4,
            file_size_range: 10..500,
        }
    }

    #[test]
    fn test_untouched_copy_has_no_changes() {
        let mut harness = DiffTestHarness::new(7);
        harness.generate_project(&small_project()).unwrap();

        let records = TreeDiffer::new()
            .diff(&harness.original(), &harness.current())
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_disk_matches_memory_mirror() {
        for seed in [1, 2, 3] {
            let mut harness = DiffTestHarness::new(seed);
            harness.generate_project(&small_project()).unwrap();
            harness.mutate(15).unwrap();
            info!("Seed {} applied {} operations", seed, harness.operation_log.len());

            let on_disk = TreeDiffer::new()
                .diff(&harness.original(), &harness.current())
                .unwrap();

            let original = load_memory_tree(harness.original_dir.path()).unwrap();
            let current = load_memory_tree(harness.current_dir.path()).unwrap();
            let in_memory = TreeDiffer::new().diff(&original, &current).unwrap();

            assert_eq!(on_disk, in_memory, "seed {}", seed);
        }
    }

    #[test]
    fn test_parallel_on_disk_matches_serial() {
        let mut harness = DiffTestHarness::new(42);
        harness.generate_project(&ProjectConfig {
            max_depth: 3,
            dirs_per_level: 3,
            files_per_dir: 3,
            file_size_range: 1..200,
        })
        .unwrap();
        harness.mutate(30).unwrap();

        let serial = TreeDiffer::new()
            .diff(&harness.original(), &harness.current())
            .unwrap();
        let parallel = TreeDiffer::builder()
            .parallel_workers(0)
            .build()
            .unwrap()
            .diff(&harness.original(), &harness.current())
            .unwrap();

        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_operations_are_reported() {
        let mut harness = DiffTestHarness::new(99);
        harness.generate_project(&small_project()).unwrap();
        harness.mutate(10).unwrap();

        let records = TreeDiffer::new()
            .diff(&harness.original(), &harness.current())
            .unwrap();
        let original = load_memory_tree(harness.original_dir.path()).unwrap();
        let current = load_memory_tree(harness.current_dir.path()).unwrap();

        for op in &harness.operation_log {
            let path = match op {
                TestOperation::ModifyFile { path }
                | TestOperation::CreateFile { path }
                | TestOperation::DeletePath { path }
                | TestOperation::FileToDirectory { path } => path,
            };

            // Paths under an added or deleted directory are never listed.
            let parent = path.parent().unwrap_or(Path::new(""));
            if original.kind_of(parent) != Some(EntryKind::Directory)
                || current.kind_of(parent) != Some(EntryKind::Directory)
            {
                continue;
            }

            let before = original.kind_of(path);
            let after = current.kind_of(path);
            if before != after {
                assert_eq!(before.is_some(), records.contains(&ChangeRecord::deleted(path)));
                assert_eq!(after.is_some(), records.contains(&ChangeRecord::added(path)));
            } else if before == Some(EntryKind::RegularFile) {
                let changed = original.read_all_bytes(path).unwrap() != current.read_all_bytes(path).unwrap();
                assert_eq!(changed, records.contains(&ChangeRecord::modified(path)));
            }
        }
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let mut harness = DiffTestHarness::new(5);
        harness.generate_project(&small_project()).unwrap();
        harness.mutate(20).unwrap();

        let differ = TreeDiffer::new();
        let first = differ.diff(&harness.original(), &harness.current()).unwrap();
        let second = differ.diff(&harness.original(), &harness.current()).unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
