//! Live widgets for resource tags
//!
//! `ResourceFile` and `ResourceImage` blocks are not text: each one becomes a
//! widget that loads its own data from the session workspace through the
//! render environment. Every widget is its own failure domain; a failed
//! fetch turns into a local error state and never fails the document.

use super::block::Block;
use crate::config::WidgetLimits;
use crate::paths::{file_name, normalize_workspace_path};
use crate::service::FileService;
use crate::utils::mime_for_path;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Everything a renderer needs to resolve resource tags
#[derive(Clone)]
pub struct RenderEnv {
    pub session_id: String,
    pub files: Arc<dyn FileService>,
    pub limits: WidgetLimits,
}

impl RenderEnv {
    pub fn new(session_id: impl Into<String>, files: Arc<dyn FileService>) -> Self {
        Self {
            session_id: session_id.into(),
            files,
            limits: WidgetLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: WidgetLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Loaded text file shown inline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    pub path: String,
    pub name: String,
    pub mime_type: Option<String>,
    pub size: u64,
    pub lines: Vec<String>,
    pub is_binary: bool,
    /// The server cut the content short
    pub server_truncated: bool,
    pub expanded: bool,
    pub limits: WidgetLimits,
}

impl FilePreview {
    fn line_cap(&self) -> usize {
        if self.expanded {
            self.limits.max_lines
        } else {
            self.limits.preview_lines
        }
    }

    pub fn visible_lines(&self) -> &[String] {
        let end = self.lines.len().min(self.line_cap());
        &self.lines[..end]
    }

    /// Lines an expand would reveal
    pub fn hidden_line_count(&self) -> usize {
        if self.expanded {
            return 0;
        }
        self.lines
            .len()
            .min(self.limits.max_lines)
            .saturating_sub(self.visible_lines().len())
    }

    pub fn can_expand(&self) -> bool {
        self.hidden_line_count() > 0
    }

    /// More lines exist than the widget will ever show
    pub fn exceeds_ceiling(&self) -> bool {
        self.lines.len() > self.limits.max_lines
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileWidget {
    Loading { path: String },
    Ready(FilePreview),
    Failed { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageWidget {
    Loading {
        path: String,
    },
    Ready {
        path: String,
        mime_type: String,
        /// Inline `data:` URI built from the authenticated byte fetch
        data_uri: String,
    },
    Failed {
        path: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    File(FileWidget),
    Image(ImageWidget),
}

/// Resolved widgets of one document, keyed by block index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Widgets {
    by_block: HashMap<usize, Widget>,
}

impl Widgets {
    pub fn get(&self, block_index: usize) -> Option<&Widget> {
        self.by_block.get(&block_index)
    }

    pub fn get_mut(&mut self, block_index: usize) -> Option<&mut Widget> {
        self.by_block.get_mut(&block_index)
    }

    pub fn len(&self) -> usize {
        self.by_block.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_block.is_empty()
    }

    /// Expand every text preview, e.g. for a full-page view
    pub fn expand_all(&mut self) {
        for widget in self.by_block.values_mut() {
            if let Widget::File(FileWidget::Ready(preview)) = widget {
                preview.expanded = true;
            }
        }
    }
}

/// Widget state before anything has loaded
pub fn pending_widget(block: &Block) -> Option<Widget> {
    match block {
        Block::ResourceFile { path } => Some(Widget::File(FileWidget::Loading {
            path: path.clone(),
        })),
        Block::ResourceImage { path } => Some(Widget::Image(ImageWidget::Loading {
            path: path.clone(),
        })),
        _ => None,
    }
}

/// Resolve every file and image resource of a document concurrently
pub async fn resolve_widgets(blocks: &[Block], env: &RenderEnv) -> Widgets {
    let loads = blocks.iter().enumerate().filter_map(|(idx, block)| match block {
        Block::ResourceFile { path } => Some(futures::future::Either::Left(async move {
            (idx, Widget::File(load_file_widget(env, path).await))
        })),
        Block::ResourceImage { path } => Some(futures::future::Either::Right(async move {
            (idx, Widget::Image(load_image_widget(env, path).await))
        })),
        _ => None,
    });

    Widgets {
        by_block: join_all(loads).await.into_iter().collect(),
    }
}

pub async fn load_file_widget(env: &RenderEnv, raw_path: &str) -> FileWidget {
    let path = normalize_workspace_path(raw_path);
    if path.is_empty() {
        return FileWidget::Failed {
            path: raw_path.to_string(),
            message: "Invalid file path".to_string(),
        };
    }

    match env.files.get_content(&env.session_id, &path).await {
        Ok(content) => {
            if let Some(message) = content.error {
                return FileWidget::Failed { path, message };
            }
            let lines = match (&content.content, content.is_binary) {
                (Some(text), false) => text.lines().map(str::to_string).collect(),
                _ => Vec::new(),
            };
            FileWidget::Ready(FilePreview {
                name: if content.name.is_empty() {
                    file_name(&path).to_string()
                } else {
                    content.name
                },
                path,
                mime_type: content.mime_type,
                size: content.size,
                lines,
                is_binary: content.is_binary,
                server_truncated: content.is_truncated,
                expanded: false,
                limits: env.limits,
            })
        }
        Err(e) => {
            warn!("failed to load inline file {}: {}", path, e);
            FileWidget::Failed {
                path,
                message: e.to_string(),
            }
        }
    }
}

pub async fn load_image_widget(env: &RenderEnv, raw_path: &str) -> ImageWidget {
    let path = normalize_workspace_path(raw_path);
    if path.is_empty() {
        return ImageWidget::Failed {
            path: raw_path.to_string(),
            message: "Invalid image path".to_string(),
        };
    }

    match env.files.fetch_bytes(&env.session_id, &path).await {
        Ok(bytes) => {
            let mime_type = mime_for_path(&path)
                .unwrap_or("application/octet-stream")
                .to_string();
            let data_uri = format!("data:{};base64,{}", mime_type, STANDARD.encode(&bytes));
            ImageWidget::Ready {
                path,
                mime_type,
                data_uri,
            }
        }
        Err(e) => {
            warn!("failed to load inline image {}: {}", path, e);
            ImageWidget::Failed {
                path,
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConsoleError, Result};
    use crate::markdown::parse;
    use ag3ntum_types::{
        DeleteResponse, DirectoryListing, FileContent, ListOptions, UploadFile, UploadResponse,
    };
    use async_trait::async_trait;
    use bytes::Bytes;

    struct StaticFiles;

    #[async_trait]
    impl FileService for StaticFiles {
        async fn list_files(&self, _: &str, _: &str, _: &ListOptions) -> Result<DirectoryListing> {
            Err(ConsoleError::Other("not used".into()))
        }

        async fn get_content(&self, _: &str, path: &str) -> Result<FileContent> {
            let content = match path {
                "long.txt" => (1..=600).map(|n| format!("line {}", n)).collect::<Vec<_>>().join("\n"),
                "short.txt" => "one\ntwo".to_string(),
                _ => return Err(ConsoleError::Http { status: 404, message: "File not found".into() }),
            };
            Ok(FileContent {
                path: path.to_string(),
                name: path.to_string(),
                mime_type: Some("text/plain".into()),
                size: content.len() as u64,
                content: Some(content),
                is_binary: false,
                is_truncated: false,
                error: None,
            })
        }

        async fn fetch_bytes(&self, _: &str, path: &str) -> Result<Bytes> {
            match path {
                "img/dot.png" => Ok(Bytes::from_static(b"\x89PNG")),
                _ => Err(ConsoleError::Http { status: 401, message: "Unauthorized".into() }),
            }
        }

        async fn delete_file(&self, _: &str, _: &str) -> Result<DeleteResponse> {
            Err(ConsoleError::Other("not used".into()))
        }

        async fn upload_files(&self, _: &str, _: &str, _: Vec<UploadFile>) -> Result<UploadResponse> {
            Err(ConsoleError::Other("not used".into()))
        }
    }

    fn env() -> RenderEnv {
        RenderEnv::new("20240115_143052_a1b2c3d4", Arc::new(StaticFiles))
    }

    #[tokio::test]
    async fn test_long_file_caps_preview_and_ceiling() {
        let FileWidget::Ready(mut preview) = load_file_widget(&env(), "./long.txt").await else {
            panic!("expected ready widget");
        };

        assert_eq!(preview.visible_lines().len(), 10);
        assert_eq!(preview.hidden_line_count(), 490);
        assert!(preview.can_expand());
        assert!(preview.exceeds_ceiling());

        preview.toggle_expanded();
        assert_eq!(preview.visible_lines().len(), 500);
        assert_eq!(preview.visible_lines()[499], "line 500");
        assert!(!preview.can_expand());
    }

    #[tokio::test]
    async fn test_short_file_has_nothing_to_expand() {
        let FileWidget::Ready(preview) = load_file_widget(&env(), "short.txt").await else {
            panic!("expected ready widget");
        };
        assert_eq!(preview.visible_lines(), ["one", "two"]);
        assert!(!preview.can_expand());
        assert!(!preview.exceeds_ceiling());
    }

    #[tokio::test]
    async fn test_failures_stay_inside_their_widget() {
        let blocks = parse(concat!(
            "<ag3ntum-file>missing.txt</ag3ntum-file>\n",
            "<ag3ntum-file>short.txt</ag3ntum-file>\n",
            "<ag3ntum-image>img/dot.png</ag3ntum-image>\n",
            "<ag3ntum-image>img/secret.png</ag3ntum-image>",
        ));
        let widgets = resolve_widgets(&blocks, &env()).await;

        assert_eq!(widgets.len(), 4);
        assert!(matches!(
            widgets.get(0),
            Some(Widget::File(FileWidget::Failed { message, .. })) if message.contains("404")
        ));
        assert!(matches!(widgets.get(1), Some(Widget::File(FileWidget::Ready(_)))));
        assert!(matches!(
            widgets.get(2),
            Some(Widget::Image(ImageWidget::Ready { data_uri, .. })) if data_uri == "data:image/png;base64,iVBORw=="
        ));
        assert!(matches!(
            widgets.get(3),
            Some(Widget::Image(ImageWidget::Failed { .. }))
        ));
    }
}
