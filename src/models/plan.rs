use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::operation::RenameOperation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanKind {
    #[serde(rename = "recognize-media-file")]
    RecognizeMediaFile,
    #[serde(rename = "rename-files")]
    RenameFiles,
}

impl std::fmt::Display for PlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecognizeMediaFile => write!(f, "recognize-media-file"),
            Self::RenameFiles => write!(f, "rename-files"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Pending,
    Confirmed,
    Completed,
    Rejected,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Completed => write!(f, "completed"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("unknown plan status: {s}")),
        }
    }
}

/// Entry in a recognition plan: a file plus what the provider lookup
/// resolved it to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionEntry {
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
}

/// One document schema serves both plan kinds; the entry shape follows
/// the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanEntry {
    Rename(RenameOperation),
    Recognition(RecognitionEntry),
}

/// Durable description of a pending rename or recognition intent. One
/// JSON document per plan; a crash between `begin`/`add` and `end`
/// leaves a recoverable, still-pending document on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub id: Uuid,
    pub kind: PlanKind,
    pub status: PlanStatus,
    pub media_folder_path: String,
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
    pub created_at: String,
    pub updated_at: String,
}
