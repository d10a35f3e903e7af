use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Tv,
    Movie,
}

/// What the metadata provider resolved this folder to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMatch {
    pub provider_id: i64,
    pub title: String,
    pub media_kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFileEntry {
    pub absolute_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtitle_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audio_paths: Vec<String>,
}

impl MediaFileEntry {
    pub fn new(absolute_path: impl Into<String>) -> Self {
        Self {
            absolute_path: absolute_path.into(),
            season_number: None,
            episode_number: None,
            subtitle_paths: Vec::new(),
            audio_paths: Vec::new(),
        }
    }
}

/// Per-managed-folder metadata cache. Every path inside is canonical;
/// mutation happens only through the propagator transforms and writes are
/// always a full-document replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFolderDocument {
    pub folder_path: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub entries: Vec<MediaFileEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification: Option<ProviderMatch>,
    pub updated_at: String,
}

impl MediaFolderDocument {
    pub fn new(folder_path: impl Into<String>) -> Self {
        Self {
            folder_path: folder_path.into(),
            files: Vec::new(),
            entries: Vec::new(),
            identification: None,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
