//! Orchestration facade over the path model, validation pipeline, plan
//! store, executor, propagator and confirmation channel. This is the API
//! the HTTP/tool-calling layer consumes.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::canon_path;
use crate::channel::ChannelHub;
use crate::error::AppError;
use crate::models::metadata::{MediaFolderDocument, ProviderMatch};
use crate::models::operation::{ExecutionResult, RenameOperation, ValidationResult};
use crate::models::plan::{PlanEntry, PlanKind, PlanStatus, RenamePlan};
use crate::services::metadata_service::{self, MetadataStore};
use crate::services::plan_service::PlanStore;
use crate::services::{rename_service, scan_service, validation_service};
use crate::state::EngineState;

pub const EVENT_PLAN_READY: &str = "plan-ready";
pub const EVENT_METADATA_UPDATED: &str = "metadata-updated";
pub const EVENT_CONFIRM_RENAMES: &str = "confirm-renames";

/// Outcome of a confirmation-gated batch. A batch with validation issues
/// is rejected whole: `execution` stays `None` and every issue is
/// reported at once. Metadata failure after a completed rename is carried
/// here instead of failing the batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub validation: ValidationResult,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_error: Option<String>,
}

/// Cache-versus-disk comparison for a managed folder.
#[derive(Debug, Clone, Serialize)]
pub struct FolderReport {
    /// Cached paths with no file on disk.
    pub missing: Vec<String>,
    /// Files on disk the cache has never seen.
    pub untracked: Vec<String>,
}

pub struct MediaEngine {
    plans: PlanStore,
    metadata: MetadataStore,
    hub: Arc<ChannelHub>,
    state: EngineState,
    confirm_timeout: Option<Duration>,
    dry_run: bool,
}

impl MediaEngine {
    /// `data_dir` hosts the `plans/` and `metadata/` trees.
    pub fn new(data_dir: &Path, hub: Arc<ChannelHub>) -> Self {
        Self {
            plans: PlanStore::new(data_dir.join("plans")),
            metadata: MetadataStore::new(data_dir.join("metadata")),
            hub,
            state: EngineState::default(),
            confirm_timeout: None,
            dry_run: false,
        }
    }

    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = Some(timeout);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn begin_task(&self, kind: PlanKind, media_folder_path: &str) -> Result<Uuid, AppError> {
        self.plans.begin(kind, media_folder_path)
    }

    pub fn add_entry(&self, task_id: &Uuid, entry: PlanEntry) -> Result<(), AppError> {
        self.plans.add(task_id, entry)
    }

    /// Finalizes the build phase and notifies the UI that a plan is ready
    /// for review. The document stays pending until `update_plan_status`.
    pub fn end_task(&self, task_id: &Uuid) -> Result<(), AppError> {
        let (plan, path) = self.plans.end(task_id)?;
        self.hub.broadcast(
            EVENT_PLAN_READY,
            json!({
                "task_id": plan.id,
                "kind": plan.kind,
                "media_folder_path": plan.media_folder_path,
                "entry_count": plan.entries.len(),
                "plan_path": path.to_string_lossy(),
            }),
        );
        Ok(())
    }

    pub fn list_pending_plans(&self) -> Result<Vec<RenamePlan>, AppError> {
        self.plans.list_pending()
    }

    pub fn update_plan_status(&self, plan_id: &Uuid, status: PlanStatus) -> Result<(), AppError> {
        self.plans.update_status(plan_id, status)
    }

    pub fn validate_batch(
        &self,
        operations: &[RenameOperation],
        media_folder: &str,
    ) -> ValidationResult {
        validation_service::validate_batch(operations, media_folder)
    }

    /// Executes without the confirmation gate; callers that bypass
    /// `rename_with_confirmation` own the approval step themselves.
    pub fn execute_batch(&self, operations: &[RenameOperation]) -> ExecutionResult {
        rename_service::execute_batch(operations, self.dry_run)
    }

    /// Requests cancellation of the in-flight flow for a client, or for
    /// every client when none is given.
    pub fn cancel(&self, client_id: Option<&str>) {
        self.state.mark_cancelled(client_id);
    }

    /// The full confirmation flow: validate, ask the owning client,
    /// execute, then propagate the cache. Cancellation is observed at
    /// each phase boundary.
    pub async fn rename_with_confirmation(
        &self,
        client_id: &str,
        media_folder: &str,
        operations: &[RenameOperation],
    ) -> Result<BatchReport, AppError> {
        let cancel = self.state.reset_cancel_flag(client_id);
        let folder = canon_path::to_canonical(media_folder);

        let validation = validation_service::validate_batch(operations, &folder);
        if !validation.is_valid() || validation.validated_operations.is_empty() {
            return Ok(BatchReport {
                validation,
                confirmed: false,
                execution: None,
                metadata_error: None,
            });
        }

        if cancel.load(Ordering::Relaxed) {
            return Err(AppError::Cancelled);
        }

        let count = validation.validated_operations.len();
        let reply = self
            .hub
            .acknowledge(
                client_id,
                EVENT_CONFIRM_RENAMES,
                json!({
                    "message": format!("Rename {count} file(s) under {folder}?"),
                    "media_folder_path": folder,
                    "operations": validation.validated_operations,
                }),
                self.confirm_timeout,
            )
            .await?;

        if !reply.is_confirmed() {
            info!("rename batch for {folder} declined by client");
            return Ok(BatchReport {
                validation,
                confirmed: false,
                execution: None,
                metadata_error: None,
            });
        }

        if cancel.load(Ordering::Relaxed) {
            return Err(AppError::Cancelled);
        }

        let execution =
            rename_service::execute_batch(&validation.validated_operations, self.dry_run);

        // The renames already happened; cancellation at this boundary only
        // skips the cache propagation.
        let metadata_error = if cancel.load(Ordering::Relaxed) {
            warn!("cancelled after execution; skipping metadata propagation for {folder}");
            None
        } else {
            match self.propagate_renames(&folder, &execution.succeeded) {
                Ok(()) => None,
                Err(err) => {
                    warn!("metadata propagation failed for {folder}: {err}");
                    Some(err.to_string())
                }
            }
        };

        self.state.clear_cancel_flag(client_id);
        Ok(BatchReport {
            validation,
            confirmed: true,
            execution: Some(execution),
            metadata_error,
        })
    }

    /// Renames a managed folder itself and re-keys its cache document:
    /// the rewritten document is saved under the new folder's key before
    /// the old key is removed.
    pub fn rename_folder(&self, from: &str, to: &str) -> Result<(), AppError> {
        if canon_path::is_abnormal(from) || canon_path::is_abnormal(to) {
            return Err(AppError::General(
                "folder path contains unresolved . or .. segments".to_string(),
            ));
        }
        let from = canon_path::to_canonical(from);
        let to = canon_path::to_canonical(to);

        if !Path::new(&canon_path::to_platform(&from)).is_dir() {
            return Err(AppError::General(format!("not a directory: {from}")));
        }
        if Path::new(&canon_path::to_platform(&to)).exists() {
            return Err(AppError::General(format!(
                "destination already exists: {to}"
            )));
        }

        if self.dry_run {
            info!("dry run: would rename folder {from} -> {to}");
        } else {
            let outcome = rename_service::execute_one(&from, &to);
            if !outcome.success {
                return Err(AppError::General(
                    outcome.error.unwrap_or_else(|| "rename failed".to_string()),
                ));
            }

            // Filesystem rename is done; cache trouble from here on is
            // logged, never surfaced as a failure of the rename.
            if let Err(err) = self.rekey_folder_document(&from, &to) {
                warn!("metadata re-key failed for {from} -> {to}: {err}");
            }
        }

        self.hub
            .broadcast(EVENT_METADATA_UPDATED, json!({ "folder_path": to }));
        Ok(())
    }

    fn rekey_folder_document(&self, from: &str, to: &str) -> Result<(), AppError> {
        let Some(doc) = self.metadata.load(from)? else {
            return Ok(());
        };
        let rewritten = metadata_service::rename_folder_in_metadata(&doc, from, to);
        self.metadata.save(&rewritten)?;
        self.metadata.remove(from)
    }

    /// Stores what the provider lookup resolved a folder to. The lookup
    /// itself lives outside this crate.
    pub fn record_identification(
        &self,
        folder: &str,
        identification: ProviderMatch,
    ) -> Result<(), AppError> {
        let folder = canon_path::to_canonical(folder);
        let mut doc = self
            .metadata
            .load(&folder)?
            .unwrap_or_else(|| MediaFolderDocument::new(folder.clone()));
        doc.identification = Some(identification);
        self.metadata.save(&doc)?;
        self.hub
            .broadcast(EVENT_METADATA_UPDATED, json!({ "folder_path": folder }));
        Ok(())
    }

    /// Re-verifies a folder's cache against the filesystem itself.
    pub fn verify_folder(&self, folder: &str) -> Result<FolderReport, AppError> {
        let folder = canon_path::to_canonical(folder);
        let cached: HashSet<String> = self
            .metadata
            .load(&folder)?
            .map(|doc| doc.files.into_iter().collect())
            .unwrap_or_default();
        let on_disk: HashSet<String> =
            scan_service::list_files(&folder, true)?.into_iter().collect();

        let mut missing: Vec<String> = cached.difference(&on_disk).cloned().collect();
        let mut untracked: Vec<String> = on_disk.difference(&cached).cloned().collect();
        missing.sort();
        untracked.sort();
        Ok(FolderReport { missing, untracked })
    }

    fn propagate_renames(
        &self,
        folder: &str,
        succeeded: &[RenameOperation],
    ) -> Result<(), AppError> {
        if succeeded.is_empty() {
            return Ok(());
        }
        // Dry runs touch neither disk nor cache.
        if self.dry_run {
            return Ok(());
        }
        let Some(doc) = self.metadata.load(folder)? else {
            return Ok(());
        };

        let rewritten = if succeeded.len() == 1 {
            metadata_service::rename_file_in_metadata(&doc, &succeeded[0].from, &succeeded[0].to)
        } else {
            metadata_service::rename_files_in_metadata(&doc, succeeded)
        };
        self.metadata.save(&rewritten)?;
        self.hub
            .broadcast(EVENT_METADATA_UPDATED, json!({ "folder_path": folder }));
        Ok(())
    }
}
