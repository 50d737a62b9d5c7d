//! Backend seam of the console core
//!
//! Both subsystems talk to the session workspace only through this trait:
//! the explorer for listings, deletes and uploads, the markdown widgets for
//! single-file content and image bytes.

use crate::error::Result;
use ag3ntum_types::{
    DeleteResponse, DirectoryListing, FileContent, ListOptions, UploadFile, UploadResponse,
};
use async_trait::async_trait;
use bytes::Bytes;

/// File endpoints of one backend, addressed per session.
///
/// Implementations carry their own base URL and credentials.
#[async_trait]
pub trait FileService: Send + Sync {
    /// List one directory (`"."` is the workspace root)
    async fn list_files(
        &self,
        session_id: &str,
        path: &str,
        options: &ListOptions,
    ) -> Result<DirectoryListing>;

    /// Fetch text content and metadata of one file
    async fn get_content(&self, session_id: &str, path: &str) -> Result<FileContent>;

    /// Fetch the raw bytes of one file with the backend's authentication
    async fn fetch_bytes(&self, session_id: &str, path: &str) -> Result<Bytes>;

    /// Delete one file or directory
    async fn delete_file(&self, session_id: &str, path: &str) -> Result<DeleteResponse>;

    /// Upload files into a directory
    async fn upload_files(
        &self,
        session_id: &str,
        dir: &str,
        files: Vec<UploadFile>,
    ) -> Result<UploadResponse>;
}
