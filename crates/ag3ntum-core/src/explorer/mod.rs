//! File explorer tree for one session workspace
//!
//! Folders load lazily on expansion. Each directory path moves through
//! `Unloaded -> Loading -> Loaded`; a failed load reports the error through
//! the error callback and drops the path back to `Unloaded` (and collapsed)
//! so the user can retry. Loaded folder contents are kept until a full
//! refresh, including across sort changes: only the root is reloaded when
//! the sort changes.
//!
//! The state lock is never held across a network call. Completions for the
//! same path are last-writer-wins.

mod view;

pub use view::{render_tree, visible_rows, TreeRow};

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::paths::{ancestor_dirs, is_descendant, is_root, listing_path, normalize_workspace_path, parent_path};
use crate::service::FileService;
use ag3ntum_types::{FileInfo, ListOptions, SortField, SortOptions, UploadFile, UploadOutcome, UploadResponse};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Called with the failing path (`""` for the root) and the error
pub type ErrorCallback = Arc<dyn Fn(&str, &ConsoleError) + Send + Sync>;

/// Explorer view state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplorerState {
    /// Root listing
    pub files: Vec<FileInfo>,
    pub total_count: usize,
    pub truncated: bool,
    pub expanded_folders: HashMap<String, bool>,
    /// Listings of folders loaded so far, keyed by normalized path
    pub folder_contents: HashMap<String, Vec<FileInfo>>,
    pub loading_folders: HashSet<String>,
    pub sort: SortOptions,
    pub highlighted: Option<String>,
    pub root_loading: bool,
    pub last_error: Option<String>,
}

impl ExplorerState {
    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded_folders.get(path).copied().unwrap_or(false)
    }

    pub fn folder_state(&self, path: &str) -> FolderState {
        if self.loading_folders.contains(path) {
            FolderState::Loading
        } else if let Some(files) = self.folder_contents.get(path) {
            FolderState::Loaded(files.clone())
        } else {
            FolderState::Unloaded
        }
    }

    fn forget_subtree(&mut self, path: &str) {
        self.folder_contents
            .retain(|p, _| p != path && !is_descendant(p, path));
        self.expanded_folders
            .retain(|p, _| p != path && !is_descendant(p, path));
        let covered = self
            .highlighted
            .as_deref()
            .map_or(false, |h| h == path || is_descendant(h, path));
        if covered {
            self.highlighted = None;
        }
    }
}

/// Point-in-time copy of the explorer state
pub type ExplorerSnapshot = ExplorerState;

/// Load state of one directory path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderState {
    Unloaded,
    Loading,
    Loaded(Vec<FileInfo>),
}

/// Listing and highlight settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplorerOptions {
    pub include_hidden: bool,
    pub limit: Option<u32>,
    pub highlight: Duration,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            include_hidden: false,
            limit: Some(500),
            highlight: Duration::from_secs(3),
        }
    }
}

impl From<&ConsoleConfig> for ExplorerOptions {
    fn from(config: &ConsoleConfig) -> Self {
        Self {
            include_hidden: config.include_hidden,
            limit: Some(config.list_limit).filter(|l| *l > 0),
            highlight: config.highlight_duration(),
        }
    }
}

/// Lazily loaded file tree of one session workspace
pub struct FileExplorer<S> {
    session_id: String,
    service: Arc<S>,
    options: ExplorerOptions,
    state: Arc<RwLock<ExplorerState>>,
    on_error: Option<ErrorCallback>,
    /// Ticket handed to each navigation when it starts
    navigation_seq: AtomicU64,
    /// Ticket of the latest navigation whose highlight was applied
    applied_navigation: AtomicU64,
    /// Bumped whenever the highlight changes; the clear timer checks it
    highlight_generation: Arc<AtomicU64>,
    highlight_timer: Mutex<Option<JoinHandle<()>>>,
}

impl<S: FileService> FileExplorer<S> {
    pub fn new(session_id: impl Into<String>, service: Arc<S>) -> Self {
        Self {
            session_id: session_id.into(),
            service,
            options: ExplorerOptions::default(),
            state: Arc::new(RwLock::new(ExplorerState::default())),
            on_error: None,
            navigation_seq: AtomicU64::new(0),
            applied_navigation: AtomicU64::new(0),
            highlight_generation: Arc::new(AtomicU64::new(0)),
            highlight_timer: Mutex::new(None),
        }
    }

    pub fn with_options(mut self, options: ExplorerOptions) -> Self {
        self.options = options;
        self
    }

    /// Start from a sort other than name ascending
    pub fn with_sort(mut self, sort: SortOptions) -> Self {
        self.state = Arc::new(RwLock::new(ExplorerState {
            sort,
            ..ExplorerState::default()
        }));
        self
    }

    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn snapshot(&self) -> ExplorerSnapshot {
        self.state.read().await.clone()
    }

    pub async fn folder_state(&self, path: &str) -> FolderState {
        let path = normalize_workspace_path(path);
        self.state.read().await.folder_state(&path)
    }

    pub async fn is_expanded(&self, path: &str) -> bool {
        let path = normalize_workspace_path(path);
        self.state.read().await.is_expanded(&path)
    }

    pub async fn visible_rows(&self) -> Vec<TreeRow> {
        visible_rows(&*self.state.read().await)
    }

    /// Load (or reload) the root listing with the current sort
    pub async fn load_root(&self) -> Result<()> {
        let sort = {
            let mut state = self.state.write().await;
            state.root_loading = true;
            state.sort
        };

        let result = self.list("", sort).await;

        let mut state = self.state.write().await;
        state.root_loading = false;
        match result {
            Ok(listing) => {
                debug!("loaded root: {} entries", listing.files.len());
                state.files = listing.files;
                state.total_count = listing.total_count;
                state.truncated = listing.truncated;
                state.last_error = None;
                Ok(())
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                drop(state);
                self.report("", &e);
                Err(e)
            }
        }
    }

    /// Expand a folder, fetching its contents unless already cached or loading
    pub async fn expand(&self, path: &str) -> Result<()> {
        let path = normalize_workspace_path(path);
        if is_root(&path) {
            return self.load_root().await;
        }

        {
            let mut state = self.state.write().await;
            state.expanded_folders.insert(path.clone(), true);
            if state.folder_contents.contains_key(&path) || state.loading_folders.contains(&path) {
                return Ok(());
            }
            state.loading_folders.insert(path.clone());
        }

        self.load_folder(&path, true).await
    }

    /// Collapse a folder, keeping its cached contents
    pub async fn collapse(&self, path: &str) {
        let path = normalize_workspace_path(path);
        self.state
            .write()
            .await
            .expanded_folders
            .insert(path, false);
    }

    /// Flip a folder's expansion; returns whether it is now expanded
    pub async fn toggle(&self, path: &str) -> Result<bool> {
        if self.is_expanded(path).await {
            self.collapse(path).await;
            Ok(false)
        } else {
            self.expand(path).await?;
            Ok(true)
        }
    }

    /// Reload the root and every expanded folder concurrently.
    ///
    /// Cached contents of collapsed folders are dropped.
    pub async fn refresh_all(&self) -> Result<()> {
        let expanded: Vec<String> = {
            let mut state = self.state.write().await;
            let expanded: Vec<String> = state
                .expanded_folders
                .iter()
                .filter(|(_, open)| **open)
                .map(|(path, _)| path.clone())
                .collect();
            state
                .folder_contents
                .retain(|path, _| expanded.contains(path));
            state.expanded_folders.retain(|_, open| *open);
            // Folders already loading keep their pending load
            let mut to_load = Vec::new();
            for path in expanded {
                if state.loading_folders.insert(path.clone()) {
                    to_load.push(path);
                }
            }
            to_load
        };

        info!("refreshing root and {} expanded folders", expanded.len());
        let folders = join_all(expanded.iter().map(|path| self.load_folder(path, true)));
        let (root, folders) = futures::join!(self.load_root(), folders);

        root?;
        folders.into_iter().collect::<Result<Vec<()>>>()?;
        Ok(())
    }

    /// Sort by `field`: the active field flips its order, a new field starts
    /// at its default order. Only the root reloads.
    pub async fn change_sort(&self, field: SortField) -> Result<SortOptions> {
        let sort = {
            let mut state = self.state.write().await;
            state.sort = if state.sort.sort_by == field {
                SortOptions {
                    sort_by: field,
                    sort_order: state.sort.sort_order.toggled(),
                }
            } else {
                SortOptions {
                    sort_by: field,
                    sort_order: field.default_order(),
                }
            };
            state.sort
        };

        debug!("sort changed to {} {}", sort.sort_by, sort.sort_order);
        self.load_root().await?;
        Ok(sort)
    }

    /// Delete on the server, then drop the entry locally
    pub async fn delete(&self, path: &str) -> Result<()> {
        let path = normalize_workspace_path(path);
        if is_root(&path) {
            return Err(ConsoleError::InvalidPath("cannot delete the workspace root".to_string()));
        }

        if let Err(e) = self.service.delete_file(&self.session_id, &path).await {
            self.state.write().await.last_error = Some(e.to_string());
            self.report(&path, &e);
            return Err(e);
        }

        let mut state = self.state.write().await;
        let parent = parent_path(&path);
        let matches = |file: &FileInfo| normalize_workspace_path(&file.path) == path;
        if is_root(parent) {
            let before = state.files.len();
            state.files.retain(|f| !matches(f));
            let removed = before - state.files.len();
            state.total_count = state.total_count.saturating_sub(removed);
        } else if let Some(files) = state.folder_contents.get_mut(parent) {
            files.retain(|f| !matches(f));
        }
        state.forget_subtree(&path);
        info!("deleted {}", path);
        Ok(())
    }

    /// Reveal a path: expand its ancestors, load the uncached ones, then
    /// highlight it for a while. Returns the normalized path.
    ///
    /// Ancestor load failures are logged and otherwise ignored. A navigation
    /// started later takes over the highlight; until one applies its own, the
    /// current highlight keeps its clear timer.
    pub async fn navigate_to(&self, target: &str) -> Result<String> {
        let path = normalize_workspace_path(target);
        if is_root(&path) {
            return Err(ConsoleError::InvalidPath(target.to_string()));
        }
        let ticket = self.navigation_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let ancestors = ancestor_dirs(&path);
        let to_load: Vec<String> = {
            let mut state = self.state.write().await;
            let mut to_load = Vec::new();
            for dir in &ancestors {
                state.expanded_folders.insert(dir.clone(), true);
                if !state.folder_contents.contains_key(dir) && !state.loading_folders.contains(dir) {
                    state.loading_folders.insert(dir.clone());
                    to_load.push(dir.clone());
                }
            }
            to_load
        };

        join_all(to_load.iter().map(|dir| self.load_folder(dir, false))).await;

        let generation = {
            let mut state = self.state.write().await;
            if self.applied_navigation.load(Ordering::SeqCst) > ticket {
                debug!("navigation to {} superseded", path);
                return Ok(path);
            }
            self.applied_navigation.store(ticket, Ordering::SeqCst);
            state.highlighted = Some(path.clone());
            self.highlight_generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        self.schedule_highlight_clear(generation);

        Ok(path)
    }

    /// Upload into a folder. Partial success is returned as such; the folder
    /// reloads whenever at least one file was stored.
    pub async fn upload(&self, dir: &str, files: Vec<UploadFile>) -> Result<UploadResponse> {
        let dir = normalize_workspace_path(dir);
        let response = match self
            .service
            .upload_files(&self.session_id, listing_path(&dir), files)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.report(&dir, &e);
                return Err(e);
            }
        };

        match response.outcome() {
            UploadOutcome::Complete => info!("uploaded {} files to {}", response.uploaded.len(), listing_path(&dir)),
            UploadOutcome::Partial => warn!(
                "uploaded {} of {} files to {}",
                response.uploaded.len(),
                response.total_count,
                listing_path(&dir)
            ),
            UploadOutcome::Failed => warn!("no files uploaded to {}", listing_path(&dir)),
        }

        if !response.uploaded.is_empty() {
            let reload = if is_root(&dir) {
                self.load_root().await
            } else {
                self.reload_if_cached(&dir).await
            };
            if let Err(e) = reload {
                debug!("reload after upload failed: {}", e);
            }
        }

        Ok(response)
    }

    /// Forget everything, including the sort and any pending highlight
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        // Navigations still in flight must not highlight afterwards
        self.applied_navigation
            .store(self.navigation_seq.load(Ordering::SeqCst) + 1, Ordering::SeqCst);
        self.highlight_generation.fetch_add(1, Ordering::SeqCst);
        self.abort_highlight_timer();
        *state = ExplorerState::default();
    }

    async fn reload_if_cached(&self, dir: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if !state.folder_contents.contains_key(dir) || state.loading_folders.contains(dir) {
                return Ok(());
            }
            state.loading_folders.insert(dir.to_string());
        }
        self.load_folder(dir, true).await
    }

    /// Fetch a folder already marked as loading and apply the result
    async fn load_folder(&self, path: &str, report: bool) -> Result<()> {
        let sort = self.state.read().await.sort;
        let result = self.list(path, sort).await;

        let mut state = self.state.write().await;
        state.loading_folders.remove(path);
        match result {
            Ok(listing) => {
                debug!("loaded {}: {} entries", path, listing.files.len());
                state.folder_contents.insert(path.to_string(), listing.files);
                Ok(())
            }
            Err(e) => {
                state.expanded_folders.remove(path);
                state.folder_contents.remove(path);
                if report {
                    state.last_error = Some(e.to_string());
                    drop(state);
                    self.report(path, &e);
                } else {
                    debug!("skipping {}: {}", path, e);
                }
                Err(e)
            }
        }
    }

    async fn list(&self, path: &str, sort: SortOptions) -> Result<ag3ntum_types::DirectoryListing> {
        let options = ListOptions {
            include_hidden: self.options.include_hidden,
            sort,
            limit: self.options.limit,
        };
        self.service
            .list_files(&self.session_id, listing_path(path), &options)
            .await
    }

    fn report(&self, path: &str, err: &ConsoleError) {
        warn!("file explorer error at {:?}: {}", listing_path(path), err);
        if let Some(ref callback) = self.on_error {
            callback(path, err);
        }
    }

    fn schedule_highlight_clear(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let current = Arc::clone(&self.highlight_generation);
        let delay = self.options.highlight;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.write().await;
            if current.load(Ordering::SeqCst) == generation {
                state.highlighted = None;
            }
        });

        if let Ok(mut timer) = self.highlight_timer.lock() {
            if let Some(previous) = timer.replace(handle) {
                previous.abort();
            }
        }
    }

    fn abort_highlight_timer(&self) {
        if let Ok(mut timer) = self.highlight_timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}

impl<S> Drop for FileExplorer<S> {
    fn drop(&mut self) {
        if let Ok(timer) = self.highlight_timer.get_mut() {
            if let Some(handle) = timer.take() {
                handle.abort();
            }
        }
    }
}
