use serde::{Deserialize, Serialize};

/// One requested rename. Both paths are canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOperation {
    pub from: String,
    pub to: String,
}

impl RenameOperation {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Structured reason an operation was rejected. Callers correlate issues
/// to operations through [`ValidationIssue::operation`], never by parsing
/// formatted messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    AbnormalPath,
    DuplicateSource,
    DuplicateDestination,
    ChainingConflict,
    SourceMissing,
    DestinationExists,
    OutsideMediaFolder,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AbnormalPath => write!(f, "path contains unresolved . or .. segments"),
            Self::DuplicateSource => write!(f, "duplicate source in batch"),
            Self::DuplicateDestination => write!(f, "duplicate destination in batch"),
            Self::ChainingConflict => {
                write!(f, "destination is the source of another operation")
            }
            Self::SourceMissing => write!(f, "source does not exist"),
            Self::DestinationExists => write!(f, "destination already exists"),
            Self::OutsideMediaFolder => write!(f, "path is outside the media folder"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub operation: RenameOperation,
    pub reason: ReasonCode,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {}: {}",
            self.operation.from, self.operation.to, self.reason
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    pub issues: Vec<ValidationIssue>,
    pub validated_operations: Vec<RenameOperation>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.issues.iter().map(|issue| issue.to_string()).collect()
    }
}

/// Result of one attempted rename. Failures carry the underlying error
/// message and never abort sibling operations.
#[derive(Debug, Clone, Serialize)]
pub struct RenameOutcome {
    pub operation: RenameOperation,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionResult {
    pub succeeded: Vec<RenameOperation>,
    pub failed: Vec<RenameOutcome>,
}

impl ExecutionResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
