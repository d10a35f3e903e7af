use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use uuid::Uuid;

use crate::canon_path;
use crate::error::AppError;
use crate::models::plan::{PlanEntry, PlanKind, PlanStatus, RenamePlan};

const PLAN_FILE_SUFFIX: &str = ".plan.json";

/// File-backed plan store: one JSON document per task under the plans
/// directory, mutated only as read-full / modify / write-full. Task
/// lifetime does not depend on process lifetime; `list_pending` is how
/// in-flight plans are recovered after a restart.
///
/// Concurrent writers to the same plan id can race (last write wins).
/// Accepted under the single-user assumption; see the test below.
pub struct PlanStore {
    plans_dir: PathBuf,
}

impl PlanStore {
    pub fn new(plans_dir: impl Into<PathBuf>) -> Self {
        Self {
            plans_dir: plans_dir.into(),
        }
    }

    pub fn plan_path(&self, task_id: &Uuid) -> PathBuf {
        self.plans_dir.join(format!("{task_id}{PLAN_FILE_SUFFIX}"))
    }

    pub fn begin(&self, kind: PlanKind, media_folder_path: &str) -> Result<Uuid, AppError> {
        fs::create_dir_all(&self.plans_dir)?;
        let now = chrono::Utc::now().to_rfc3339();
        let plan = RenamePlan {
            id: Uuid::new_v4(),
            kind,
            status: PlanStatus::Pending,
            media_folder_path: canon_path::to_canonical(media_folder_path),
            entries: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        self.write(&plan)?;
        Ok(plan.id)
    }

    pub fn add(&self, task_id: &Uuid, entry: PlanEntry) -> Result<(), AppError> {
        let mut plan = self.read(task_id)?;
        if plan.status != PlanStatus::Pending {
            return Err(AppError::PlanNotPending(task_id.to_string()));
        }
        plan.entries.push(entry);
        plan.updated_at = chrono::Utc::now().to_rfc3339();
        self.write(&plan)
    }

    /// Finalizes the build phase. Requires at least one entry and leaves
    /// the document untouched and pending; the caller notifies the UI and
    /// later settles the status through `update_status`.
    pub fn end(&self, task_id: &Uuid) -> Result<(RenamePlan, PathBuf), AppError> {
        let plan = self.read(task_id)?;
        if plan.status != PlanStatus::Pending {
            return Err(AppError::PlanNotPending(task_id.to_string()));
        }
        if plan.entries.is_empty() {
            return Err(AppError::General(format!(
                "plan {task_id} has no entries"
            )));
        }
        let path = self.plan_path(task_id);
        Ok((plan, path))
    }

    /// Scans the plans directory for still-pending documents, skipping
    /// anything unparseable. Ordered by creation time so recovery is
    /// deterministic.
    pub fn list_pending(&self) -> Result<Vec<RenamePlan>, AppError> {
        let mut pending = Vec::new();
        let entries = match fs::read_dir(&self.plans_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(pending),
            Err(err) => return Err(err.into()),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !is_plan_file(&path) {
                continue;
            }
            match read_plan_file(&path) {
                Ok(plan) => {
                    if plan.status == PlanStatus::Pending {
                        pending.push(plan);
                    }
                }
                Err(err) => {
                    warn!("skipping unparseable plan file {}: {err}", path.display());
                }
            }
        }

        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }

    /// Settles a plan the UI has reviewed. Matches on the document's
    /// internal `id` field, and only a pending plan may move.
    pub fn update_status(&self, plan_id: &Uuid, status: PlanStatus) -> Result<(), AppError> {
        let entries = match fs::read_dir(&self.plans_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::TaskNotFound(plan_id.to_string()))
            }
            Err(err) => return Err(err.into()),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !is_plan_file(&path) {
                continue;
            }
            let mut plan = match read_plan_file(&path) {
                Ok(plan) => plan,
                Err(err) => {
                    warn!("skipping unparseable plan file {}: {err}", path.display());
                    continue;
                }
            };
            if plan.id != *plan_id {
                continue;
            }
            if plan.status != PlanStatus::Pending {
                return Err(AppError::PlanNotPending(plan_id.to_string()));
            }
            plan.status = status;
            plan.updated_at = chrono::Utc::now().to_rfc3339();
            return self.write(&plan);
        }

        Err(AppError::TaskNotFound(plan_id.to_string()))
    }

    fn read(&self, task_id: &Uuid) -> Result<RenamePlan, AppError> {
        let path = self.plan_path(task_id);
        if !path.exists() {
            return Err(AppError::TaskNotFound(task_id.to_string()));
        }
        read_plan_file(&path)
    }

    fn write(&self, plan: &RenamePlan) -> Result<(), AppError> {
        let path = self.plan_path(&plan.id);
        fs::write(path, serde_json::to_string_pretty(plan)?)?;
        Ok(())
    }
}

fn is_plan_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(PLAN_FILE_SUFFIX))
        .unwrap_or(false)
}

fn read_plan_file(path: &Path) -> Result<RenamePlan, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::operation::RenameOperation;

    fn store() -> (tempfile::TempDir, PlanStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(dir.path().join("plans"));
        (dir, store)
    }

    fn rename_entry(from: &str, to: &str) -> PlanEntry {
        PlanEntry::Rename(RenameOperation::new(from, to))
    }

    #[test]
    fn begin_add_end_lifecycle() {
        let (_dir, store) = store();
        let id = store.begin(PlanKind::RenameFiles, "/media/show").unwrap();

        store
            .add(&id, rename_entry("/media/show/a.mkv", "/media/show/b.mkv"))
            .unwrap();
        store
            .add(&id, rename_entry("/media/show/c.mkv", "/media/show/d.mkv"))
            .unwrap();

        let (plan, path) = store.end(&id).unwrap();
        assert_eq!(plan.entries.len(), 2);
        assert_eq!(plan.status, PlanStatus::Pending);
        assert!(path.exists());
    }

    #[test]
    fn end_with_no_entries_errors() {
        let (_dir, store) = store();
        let id = store.begin(PlanKind::RenameFiles, "/media/show").unwrap();

        let err = store.end(&id).unwrap_err();
        assert!(err.to_string().contains("no entries"));
    }

    #[test]
    fn add_to_unknown_task_is_not_found() {
        let (_dir, store) = store();
        store.begin(PlanKind::RenameFiles, "/media/show").unwrap();

        let err = store
            .add(&Uuid::new_v4(), rename_entry("/m/a", "/m/b"))
            .unwrap_err();
        assert!(matches!(err, AppError::TaskNotFound(_)));
    }

    #[test]
    fn pending_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let plans_dir = dir.path().join("plans");
        let id = {
            let store = PlanStore::new(&plans_dir);
            let id = store
                .begin(PlanKind::RecognizeMediaFile, "/media/show")
                .unwrap();
            store
                .add(
                    &id,
                    PlanEntry::Recognition(crate::models::plan::RecognitionEntry {
                        file_path: "/media/show/e1.mkv".to_string(),
                        season_number: Some(1),
                        episode_number: Some(1),
                    }),
                )
                .unwrap();
            id
        };

        // A fresh store over the same directory stands in for a restart.
        let recovered = PlanStore::new(&plans_dir).list_pending().unwrap();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].id, id);
        assert_eq!(recovered[0].entries.len(), 1);
    }

    #[test]
    fn list_pending_skips_unparseable_files() {
        let (_dir, store) = store();
        store.begin(PlanKind::RenameFiles, "/media/show").unwrap();
        fs::write(
            store.plans_dir.join("broken.plan.json"),
            "{ this is not json",
        )
        .unwrap();

        let pending = store.list_pending().unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn updated_plan_leaves_pending_listing() {
        let (_dir, store) = store();
        let id = store.begin(PlanKind::RenameFiles, "/media/show").unwrap();
        store
            .add(&id, rename_entry("/media/show/a.mkv", "/media/show/b.mkv"))
            .unwrap();

        store.update_status(&id, PlanStatus::Rejected).unwrap();

        assert!(store.list_pending().unwrap().is_empty());
        let err = store.update_status(&id, PlanStatus::Completed).unwrap_err();
        assert!(matches!(err, AppError::PlanNotPending(_)));
    }

    #[test]
    fn update_status_for_unknown_plan_is_not_found() {
        let (_dir, store) = store();
        store.begin(PlanKind::RenameFiles, "/media/show").unwrap();

        let err = store
            .update_status(&Uuid::new_v4(), PlanStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, AppError::TaskNotFound(_)));
    }

    // Known limitation (single-user assumption): the store is plain
    // read/modify/write with no locking, so two writers whose reads
    // interleave lose one update. Sequential cross-store writes compose;
    // this documents the behavior rather than guarding against it.
    #[test]
    fn sequential_cross_store_writes_compose() {
        let dir = tempfile::tempdir().unwrap();
        let plans_dir = dir.path().join("plans");
        let store_a = PlanStore::new(&plans_dir);
        let store_b = PlanStore::new(&plans_dir);
        let id = store_a.begin(PlanKind::RenameFiles, "/media/show").unwrap();

        store_a
            .add(&id, rename_entry("/media/show/a.mkv", "/media/show/b.mkv"))
            .unwrap();
        store_b
            .add(&id, rename_entry("/media/show/c.mkv", "/media/show/d.mkv"))
            .unwrap();

        let (plan, _) = store_a.end(&id).unwrap();
        assert_eq!(plan.entries.len(), 2);
    }
}
