//! Session workspace file types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry of a directory listing.
///
/// `path` is POSIX-style, relative to the session workspace root, and is the
/// unique key of the node within one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub is_directory: bool,
    /// Meaningless for directories; the console renders it blank.
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_viewable: bool,
    #[serde(default)]
    pub is_readonly: bool,
}

impl FileInfo {
    /// Convenience constructor for a plain file entry
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        Self {
            name: path.rsplit('/').next().unwrap_or_default().to_string(),
            path,
            is_directory: false,
            size,
            created_at: None,
            modified_at: None,
            mime_type: None,
            is_hidden: false,
            is_viewable: true,
            is_readonly: false,
        }
    }

    /// Convenience constructor for a directory entry
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            is_directory: true,
            is_viewable: false,
            ..Self::file(path, 0)
        }
    }
}

/// Field a listing is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Size,
    ModifiedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Size => "size",
            SortField::ModifiedAt => "modified_at",
        }
    }

    /// Order applied when switching to this field from another one
    pub fn default_order(&self) -> SortOrder {
        match self {
            SortField::Name => SortOrder::Asc,
            SortField::Size | SortField::ModifiedAt => SortOrder::Desc,
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "size" => Ok(SortField::Size),
            "modified_at" | "modified" | "mtime" => Ok(SortField::ModifiedAt),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Active sort of the explorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOptions {
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for SortOptions {
    fn default() -> Self {
        Self {
            sort_by: SortField::Name,
            sort_order: SortOrder::Asc,
        }
    }
}

/// Query options of the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub include_hidden: bool,
    #[serde(flatten)]
    pub sort: SortOptions,
    pub limit: Option<u32>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            include_hidden: false,
            sort: SortOptions::default(),
            limit: None,
        }
    }
}

/// Response of the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    pub path: String,
    pub files: Vec<FileInfo>,
    pub total_count: usize,
    #[serde(default)]
    pub truncated: bool,
}

/// Response of the file content endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_binary: bool,
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// A file queued for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadError {
    #[serde(alias = "name")]
    pub filename: String,
    pub error: String,
}

/// Response of the upload endpoint; partial success is representable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub uploaded: Vec<UploadedFile>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub errors: Vec<UploadError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Complete,
    Partial,
    Failed,
}

impl UploadResponse {
    pub fn outcome(&self) -> UploadOutcome {
        match (self.uploaded.is_empty(), self.errors.is_empty()) {
            (_, true) => UploadOutcome::Complete,
            (false, false) => UploadOutcome::Partial,
            (true, false) => UploadOutcome::Failed,
        }
    }
}

/// Response of the delete endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: String,
    pub path: String,
}
