use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::canon_path;
use crate::models::operation::{ReasonCode, RenameOperation, ValidationIssue, ValidationResult};

/// True when no operation's destination is another operation's source,
/// i.e. the batch applies the same way in any order.
pub fn no_chaining_conflicts(operations: &[RenameOperation]) -> bool {
    let sources: HashSet<&str> = operations.iter().map(|op| op.from.as_str()).collect();
    operations.iter().all(|op| !sources.contains(op.to.as_str()))
}

/// Runs every check over the whole batch and accumulates issues instead of
/// short-circuiting, so the caller can correct the entire request in one
/// iteration. Never mutates filesystem state; checks 6 and 7 only probe
/// for existence.
pub fn validate_batch(operations: &[RenameOperation], media_folder: &str) -> ValidationResult {
    let folder = canon_path::to_canonical(media_folder);

    let mut issues: Vec<ValidationIssue> = Vec::new();
    let mut excluded = vec![false; operations.len()];

    // 1. Abnormal paths first; every later check assumes clean spellings,
    // so flagged entries sit out the rest of the pipeline.
    let abnormal: Vec<bool> = operations
        .iter()
        .map(|op| canon_path::is_abnormal(&op.from) || canon_path::is_abnormal(&op.to))
        .collect();

    let canonical: Vec<RenameOperation> = operations
        .iter()
        .map(|op| {
            RenameOperation::new(
                canon_path::to_canonical(&op.from),
                canon_path::to_canonical(&op.to),
            )
        })
        .collect();

    for (idx, flagged) in abnormal.iter().enumerate() {
        if *flagged {
            issues.push(ValidationIssue {
                operation: canonical[idx].clone(),
                reason: ReasonCode::AbnormalPath,
            });
            excluded[idx] = true;
        }
    }

    let clean = |idx: usize| !abnormal[idx];

    // 2. Duplicate sources.
    let mut source_counts: HashMap<&str, usize> = HashMap::new();
    for (idx, op) in canonical.iter().enumerate() {
        if clean(idx) {
            *source_counts.entry(op.from.as_str()).or_insert(0) += 1;
        }
    }
    for (idx, op) in canonical.iter().enumerate() {
        if clean(idx) && source_counts[op.from.as_str()] > 1 {
            issues.push(ValidationIssue {
                operation: op.clone(),
                reason: ReasonCode::DuplicateSource,
            });
            excluded[idx] = true;
        }
    }

    // 3. Duplicate destinations.
    let mut dest_counts: HashMap<&str, usize> = HashMap::new();
    for (idx, op) in canonical.iter().enumerate() {
        if clean(idx) {
            *dest_counts.entry(op.to.as_str()).or_insert(0) += 1;
        }
    }
    for (idx, op) in canonical.iter().enumerate() {
        if clean(idx) && dest_counts[op.to.as_str()] > 1 {
            issues.push(ValidationIssue {
                operation: op.clone(),
                reason: ReasonCode::DuplicateDestination,
            });
            excluded[idx] = true;
        }
    }

    // 4. Identical source/destination entries are dropped silently, not
    // errors, and take no part in the remaining checks.
    let identity: Vec<bool> = canonical.iter().map(|op| op.from == op.to).collect();

    let active = |idx: usize| clean(idx) && !identity[idx];

    // 5. Chaining conflicts: a destination that is also a source in the
    // same batch makes sequential application order-dependent.
    let sources: HashSet<&str> = canonical
        .iter()
        .enumerate()
        .filter(|(idx, _)| active(*idx))
        .map(|(_, op)| op.from.as_str())
        .collect();
    for (idx, op) in canonical.iter().enumerate() {
        if active(idx) && sources.contains(op.to.as_str()) {
            issues.push(ValidationIssue {
                operation: op.clone(),
                reason: ReasonCode::ChainingConflict,
            });
            excluded[idx] = true;
        }
    }

    // 6. Sources must exist on disk, as a file or a directory.
    for (idx, op) in canonical.iter().enumerate() {
        if active(idx) && !Path::new(&canon_path::to_platform(&op.from)).exists() {
            issues.push(ValidationIssue {
                operation: op.clone(),
                reason: ReasonCode::SourceMissing,
            });
            excluded[idx] = true;
        }
    }

    // 7. Destinations must not already exist as files. An existing
    // directory is tolerated: it may legitimately be the parent of the
    // target.
    for (idx, op) in canonical.iter().enumerate() {
        if active(idx) && Path::new(&canon_path::to_platform(&op.to)).is_file() {
            issues.push(ValidationIssue {
                operation: op.clone(),
                reason: ReasonCode::DestinationExists,
            });
            excluded[idx] = true;
        }
    }

    // 8. Containment within the media folder subtree.
    for (idx, op) in canonical.iter().enumerate() {
        if active(idx)
            && (!canon_path::is_ancestor_of(&folder, &op.from)
                || !canon_path::is_ancestor_of(&folder, &op.to))
        {
            issues.push(ValidationIssue {
                operation: op.clone(),
                reason: ReasonCode::OutsideMediaFolder,
            });
            excluded[idx] = true;
        }
    }

    let validated_operations = canonical
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !identity[*idx] && !excluded[*idx])
        .map(|(_, op)| op)
        .collect();

    ValidationResult {
        issues,
        validated_operations,
    }
}
