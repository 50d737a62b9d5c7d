//! In-memory session workspace shared by the integration tests

use ag3ntum_core::error::{ConsoleError, Result};
use ag3ntum_core::paths::{file_name, is_descendant, join_path, listing_path, normalize_workspace_path};
use ag3ntum_core::types::{
    DeleteResponse, DirectoryListing, FileContent, FileInfo, ListOptions, SortField, SortOrder,
    UploadError, UploadFile, UploadResponse, UploadedFile,
};
use ag3ntum_core::FileService;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const SESSION: &str = "20240115_143052_a1b2c3d4";

/// Files keyed by path; directories are implied by their contents
#[derive(Default)]
pub struct MemoryWorkspace {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    pub list_calls: AtomicUsize,
    /// Uploads with names longer than this are rejected
    pub max_upload_name: usize,
}

impl MemoryWorkspace {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: Mutex::new(
                files
                    .iter()
                    .map(|(path, body)| (path.to_string(), body.as_bytes().to_vec()))
                    .collect(),
            ),
            list_calls: AtomicUsize::new(0),
            max_upload_name: 32,
        }
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn is_dir(files: &BTreeMap<String, Vec<u8>>, path: &str) -> bool {
        files.keys().any(|p| is_descendant(p, path))
    }
}

#[async_trait]
impl FileService for MemoryWorkspace {
    async fn list_files(&self, _: &str, path: &str, options: &ListOptions) -> Result<DirectoryListing> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let dir = normalize_workspace_path(path);
        let files = self.files.lock().unwrap();
        if !dir.is_empty() && !Self::is_dir(&files, &dir) {
            return Err(ConsoleError::Http {
                status: 404,
                message: format!("Directory not found: {}", dir),
            });
        }

        let mut entries: BTreeMap<String, FileInfo> = BTreeMap::new();
        for (path, body) in files.iter().filter(|(p, _)| is_descendant(p, &dir)) {
            let rest = if dir.is_empty() { path.as_str() } else { &path[dir.len() + 1..] };
            match rest.split_once('/') {
                Some((child, _)) => {
                    let child_path = join_path(&dir, child);
                    entries
                        .entry(child_path.clone())
                        .or_insert_with(|| FileInfo::directory(child_path));
                }
                None => {
                    entries.insert(path.clone(), FileInfo::file(path.clone(), body.len() as u64));
                }
            }
        }

        let mut files: Vec<FileInfo> = entries.into_values().collect();
        match options.sort.sort_by {
            SortField::Size => files.sort_by_key(|f| f.size),
            _ => files.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        if options.sort.sort_order == SortOrder::Desc {
            files.reverse();
        }

        Ok(DirectoryListing {
            path: listing_path(&dir).to_string(),
            total_count: files.len(),
            files,
            truncated: false,
        })
    }

    async fn get_content(&self, _: &str, path: &str) -> Result<FileContent> {
        let files = self.files.lock().unwrap();
        let body = files
            .get(path)
            .ok_or_else(|| ConsoleError::Http {
                status: 404,
                message: format!("File not found: {}", path),
            })?;
        let content = String::from_utf8(body.clone()).ok();
        Ok(FileContent {
            path: path.to_string(),
            name: file_name(path).to_string(),
            mime_type: ag3ntum_core::utils::mime_for_path(path).map(str::to_string),
            size: body.len() as u64,
            is_binary: content.is_none(),
            content,
            is_truncated: false,
            error: None,
        })
    }

    async fn fetch_bytes(&self, _: &str, path: &str) -> Result<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|body| Bytes::from(body.clone()))
            .ok_or_else(|| ConsoleError::Http {
                status: 404,
                message: format!("File not found: {}", path),
            })
    }

    async fn delete_file(&self, _: &str, path: &str) -> Result<DeleteResponse> {
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|p, _| p != path && !is_descendant(p, path));
        if files.len() == before {
            return Err(ConsoleError::Http {
                status: 404,
                message: format!("File not found: {}", path),
            });
        }
        Ok(DeleteResponse {
            status: "deleted".to_string(),
            path: path.to_string(),
        })
    }

    async fn upload_files(&self, _: &str, dir: &str, uploads: Vec<UploadFile>) -> Result<UploadResponse> {
        let dir = normalize_workspace_path(dir);
        let mut files = self.files.lock().unwrap();
        let mut response = UploadResponse {
            total_count: uploads.len(),
            ..UploadResponse::default()
        };
        for upload in uploads {
            if upload.name.len() > self.max_upload_name {
                response.errors.push(UploadError {
                    filename: upload.name,
                    error: "Filename too long".to_string(),
                });
                continue;
            }
            let path = join_path(&dir, &upload.name);
            response.uploaded.push(UploadedFile {
                name: upload.name,
                path: path.clone(),
                size: upload.bytes.len() as u64,
            });
            files.insert(path, upload.bytes);
        }
        Ok(response)
    }
}
