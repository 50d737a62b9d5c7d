//! Markdown rendering engine
//!
//! A deliberately small, line-oriented markdown dialect for agent output,
//! extended with `<ag3ntum-*>` resource tags that render as live widgets.
//! Parsing is pure and synchronous; only widget resolution touches the
//! network.

pub mod block;
pub mod html;
pub mod inline;
pub mod resource;
pub mod widgets;

pub use block::{Block, ListMarker};
pub use html::{render_blocks, RenderOptions};
pub use inline::{parse_inline, plain_text, Inline};
pub use resource::{parse_attached_files, sanitize_display_name, AttachedFileEntry};
pub use widgets::{
    load_file_widget, load_image_widget, pending_widget, resolve_widgets, FilePreview, FileWidget,
    ImageWidget, RenderEnv, Widget, Widgets,
};

/// Parse a document into its block sequence
pub fn parse(document: &str) -> Vec<Block> {
    block::parse_blocks(document)
}

/// Render a document without resolving resource widgets
pub fn render_html(document: &str, options: &RenderOptions) -> String {
    render_blocks(&parse(document), None, options)
}

/// Parse, resolve every resource widget, then render
pub async fn render_document(document: &str, env: &RenderEnv, options: &RenderOptions) -> String {
    let blocks = parse(document);
    let widgets = resolve_widgets(&blocks, env).await;
    render_blocks(&blocks, Some(&widgets), options)
}
