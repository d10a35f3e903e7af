use std::fs;
use std::path::Path;

use log::info;

use crate::canon_path;
use crate::models::operation::{ExecutionResult, RenameOperation, RenameOutcome};

/// Performs one rename against the real filesystem. The destination's
/// parent directory is created first so a batch can move files into a
/// not-yet-existing season folder. No retry, no undo.
pub fn execute_one(from: &str, to: &str) -> RenameOutcome {
    let operation = RenameOperation::new(
        canon_path::to_canonical(from),
        canon_path::to_canonical(to),
    );
    let source = canon_path::to_platform(&operation.from);
    let dest = canon_path::to_platform(&operation.to);

    let result = (|| -> std::io::Result<()> {
        if let Some(parent) = Path::new(&dest).parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&source, &dest)
    })();

    match result {
        Ok(()) => RenameOutcome {
            operation,
            success: true,
            error: None,
        },
        Err(err) => RenameOutcome {
            operation,
            success: false,
            error: Some(err.to_string()),
        },
    }
}

/// Runs the batch sequentially. Failures are collected, not rolled back:
/// the caller gets the successful subset for cache propagation and the
/// failed subset for reporting. With `dry_run` set, nothing touches disk
/// and every operation reports success.
pub fn execute_batch(operations: &[RenameOperation], dry_run: bool) -> ExecutionResult {
    let mut result = ExecutionResult::default();

    for op in operations {
        if dry_run {
            info!("dry run: would rename {} -> {}", op.from, op.to);
            result.succeeded.push(op.clone());
            continue;
        }

        let outcome = execute_one(&op.from, &op.to);
        if outcome.success {
            result.succeeded.push(outcome.operation);
        } else {
            result.failed.push(outcome);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    #[test]
    fn execute_one_renames_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("old.mkv");
        File::create(&src).unwrap().write_all(b"video").unwrap();
        let dest = dir.path().join("Season 01").join("new.mkv");

        let outcome = execute_one(&src.to_string_lossy(), &dest.to_string_lossy());

        assert!(outcome.success, "{:?}", outcome.error);
        assert!(!src.exists());
        assert!(dest.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "video");
    }

    #[test]
    fn execute_one_reports_failure_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ghost.mkv");
        let dest = dir.path().join("new.mkv");

        let outcome = execute_one(&missing.to_string_lossy(), &dest.to_string_lossy());

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn batch_failure_does_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.mkv");
        File::create(&good).unwrap();
        let root = crate::canon_path::to_canonical(&dir.path().to_string_lossy());

        let ops = vec![
            RenameOperation::new(format!("{root}/ghost.mkv"), format!("{root}/x.mkv")),
            RenameOperation::new(format!("{root}/a.mkv"), format!("{root}/b.mkv")),
        ];
        let result = execute_batch(&ops, false);

        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.succeeded.len(), 1);
        assert!(dir.path().join("b.mkv").exists());
    }

    #[test]
    fn dry_run_leaves_disk_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.mkv");
        File::create(&src).unwrap();
        let root = crate::canon_path::to_canonical(&dir.path().to_string_lossy());

        let ops = vec![RenameOperation::new(
            format!("{root}/a.mkv"),
            format!("{root}/b.mkv"),
        )];
        let result = execute_batch(&ops, true);

        assert!(result.all_succeeded());
        assert!(src.exists());
        assert!(!dir.path().join("b.mkv").exists());
    }
}
