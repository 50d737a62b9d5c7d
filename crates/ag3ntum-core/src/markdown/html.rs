//! HTML output for parsed documents
//!
//! Class names carry a configurable prefix that exists only as a styling
//! hook. Resource blocks render from their widget state; a block without a
//! resolved widget renders as a loading placeholder.

use super::block::{Block, ListMarker};
use super::inline::Inline;
use super::resource::AttachedFileEntry;
use super::widgets::{pending_widget, FilePreview, FileWidget, ImageWidget, Widget, Widgets};
use crate::config::RenderSettings;
use std::fmt::Write;

/// Output options of the HTML renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub class_prefix: String,
    /// Wrap the output in a single container element
    pub wrap_container: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            class_prefix: "md".to_string(),
            wrap_container: true,
        }
    }
}

impl From<&RenderSettings> for RenderOptions {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            class_prefix: settings.class_prefix.clone(),
            wrap_container: settings.wrap_container,
        }
    }
}

struct HtmlWriter<'a> {
    out: String,
    prefix: &'a str,
}

impl<'a> HtmlWriter<'a> {
    fn class(&self, name: &str) -> String {
        format!("{}-{}", self.prefix, name)
    }

    fn block(&mut self, index: usize, block: &Block, widgets: Option<&Widgets>) {
        match block {
            Block::Heading { level, children } => {
                let class = self.class(&format!("h{}", level));
                let _ = write!(self.out, "<h{} class=\"{}\">", level, class);
                self.inlines(children);
                let _ = write!(self.out, "</h{}>", level);
            }
            Block::CodeBlock { language, code } => {
                let class = self.class("code");
                let _ = write!(self.out, "<pre class=\"{}\"", class);
                if let Some(lang) = language {
                    let _ = write!(self.out, " data-language=\"{}\"", escape(lang));
                }
                let _ = write!(self.out, "><code>{}</code></pre>", escape(code));
            }
            Block::Table { header, rows } => {
                let _ = write!(self.out, "<table class=\"{}\"><thead><tr>", self.class("table"));
                for cell in header {
                    self.out.push_str("<th>");
                    self.inlines(&super::inline::parse_inline(cell));
                    self.out.push_str("</th>");
                }
                self.out.push_str("</tr></thead><tbody>");
                for row in rows {
                    self.out.push_str("<tr>");
                    for cell in row {
                        self.out.push_str("<td>");
                        self.inlines(&super::inline::parse_inline(cell));
                        self.out.push_str("</td>");
                    }
                    self.out.push_str("</tr>");
                }
                self.out.push_str("</tbody></table>");
            }
            Block::ListItem {
                marker,
                indent,
                children,
            } => {
                let marker = match marker {
                    ListMarker::Bullet(_) => "•".to_string(),
                    ListMarker::Ordered(n) => format!("{}.", n),
                };
                let _ = write!(
                    self.out,
                    "<div class=\"{}\" style=\"padding-left: {}px\"><span class=\"{}\">{}</span> ",
                    self.class("li"),
                    indent * 8,
                    self.class("marker"),
                    marker
                );
                self.inlines(children);
                self.out.push_str("</div>");
            }
            Block::Blockquote(children) => {
                let _ = write!(self.out, "<blockquote class=\"{}\">", self.class("quote"));
                self.inlines(children);
                self.out.push_str("</blockquote>");
            }
            Block::HorizontalRule => {
                let _ = write!(self.out, "<hr class=\"{}\"/>", self.class("hr"));
            }
            Block::Paragraph(children) => {
                let _ = write!(self.out, "<p class=\"{}\">", self.class("p"));
                self.inlines(children);
                self.out.push_str("</p>");
            }
            Block::Spacer => {
                let _ = write!(self.out, "<div class=\"{}\"></div>", self.class("spacer"));
            }
            Block::ResourceFile { .. } | Block::ResourceImage { .. } => {
                let resolved = widgets.and_then(|w| w.get(index)).cloned();
                match resolved.or_else(|| pending_widget(block)) {
                    Some(Widget::File(widget)) => self.file_widget(&widget),
                    Some(Widget::Image(widget)) => self.image_widget(&widget),
                    None => {}
                }
            }
            Block::ResourceAttachedFiles { entries } => self.attachments(entries),
        }
    }

    fn file_widget(&mut self, widget: &FileWidget) {
        let class = self.class("file");
        match widget {
            FileWidget::Loading { path } => {
                let _ = write!(
                    self.out,
                    "<div class=\"{} {}\">Loading {}…</div>",
                    class,
                    self.class("loading"),
                    escape(path)
                );
            }
            FileWidget::Failed { path, message } => {
                let _ = write!(
                    self.out,
                    "<div class=\"{} {}\">Failed to load {}: {}</div>",
                    class,
                    self.class("error"),
                    escape(path),
                    escape(message)
                );
            }
            FileWidget::Ready(preview) => self.file_preview(preview),
        }
    }

    fn file_preview(&mut self, preview: &FilePreview) {
        let _ = write!(
            self.out,
            "<div class=\"{}\" data-path=\"{}\"><div class=\"{}\"><span class=\"{}\">{}</span><span class=\"{}\">{}</span></div>",
            self.class("file"),
            escape(&preview.path),
            self.class("file-header"),
            self.class("file-name"),
            escape(&preview.name),
            self.class("file-size"),
            crate::utils::format_size(preview.size)
        );

        if preview.is_binary {
            let _ = write!(
                self.out,
                "<div class=\"{}\">Binary file, preview not available</div>",
                self.class("notice")
            );
        } else if preview.lines.is_empty() {
            let _ = write!(self.out, "<div class=\"{}\">(empty file)</div>", self.class("notice"));
        } else {
            let text = preview.visible_lines().join("\n");
            let _ = write!(
                self.out,
                "<pre class=\"{}\"><code>{}</code></pre>",
                self.class("file-content"),
                escape(&text)
            );
            if preview.can_expand() {
                let _ = write!(
                    self.out,
                    "<div class=\"{}\">Show {} more lines</div>",
                    self.class("file-more"),
                    preview.hidden_line_count()
                );
            }
            if preview.expanded && preview.exceeds_ceiling() {
                let _ = write!(
                    self.out,
                    "<div class=\"{}\">Showing first {} of {} lines</div>",
                    self.class("file-truncated"),
                    preview.limits.max_lines,
                    preview.lines.len()
                );
            }
        }

        if preview.server_truncated {
            let _ = write!(
                self.out,
                "<div class=\"{}\">File truncated by server</div>",
                self.class("notice")
            );
        }
        self.out.push_str("</div>");
    }

    fn image_widget(&mut self, widget: &ImageWidget) {
        let class = self.class("image");
        match widget {
            ImageWidget::Loading { path } => {
                let _ = write!(
                    self.out,
                    "<div class=\"{} {}\">Loading {}…</div>",
                    class,
                    self.class("loading"),
                    escape(path)
                );
            }
            ImageWidget::Failed { path, message } => {
                let _ = write!(
                    self.out,
                    "<div class=\"{} {}\">Failed to load {}: {}</div>",
                    class,
                    self.class("error"),
                    escape(path),
                    escape(message)
                );
            }
            ImageWidget::Ready { path, data_uri, .. } => {
                let _ = write!(
                    self.out,
                    "<figure class=\"{}\"><img src=\"{}\" alt=\"{}\"/><figcaption>{}</figcaption></figure>",
                    class,
                    escape(data_uri),
                    escape(crate::paths::file_name(path)),
                    escape(path)
                );
            }
        }
    }

    fn attachments(&mut self, entries: &[AttachedFileEntry]) {
        let label = match entries.len() {
            1 => "1 attached file".to_string(),
            n => format!("{} attached files", n),
        };
        let _ = write!(
            self.out,
            "<details class=\"{}\" open><summary>{}</summary><ul>",
            self.class("attachments"),
            label
        );
        for entry in entries {
            let _ = write!(
                self.out,
                "<li><span class=\"{}\">{}</span>",
                self.class("attachment-name"),
                escape(&entry.name)
            );
            if let Some(ref size) = entry.size_formatted {
                let _ = write!(
                    self.out,
                    "<span class=\"{}\">{}</span>",
                    self.class("attachment-size"),
                    escape(size)
                );
            }
            if let Some(ref mime) = entry.mime_type {
                let _ = write!(
                    self.out,
                    "<span class=\"{}\">{}</span>",
                    self.class("attachment-type"),
                    escape(mime)
                );
            }
            self.out.push_str("</li>");
        }
        self.out.push_str("</ul></details>");
    }

    fn inlines(&mut self, nodes: &[Inline]) {
        for node in nodes {
            match node {
                Inline::Text(text) => self.out.push_str(&escape(text)),
                Inline::Bold(children) => {
                    self.out.push_str("<strong>");
                    self.inlines(children);
                    self.out.push_str("</strong>");
                }
                Inline::Italic(text) => {
                    let _ = write!(self.out, "<em>{}</em>", escape(text));
                }
                Inline::Code(text) => {
                    let _ = write!(
                        self.out,
                        "<code class=\"{}\">{}</code>",
                        self.class("inline-code"),
                        escape(text)
                    );
                }
                Inline::Link { text, url } => {
                    let _ = write!(
                        self.out,
                        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
                        escape(safe_url(url)),
                        escape(text)
                    );
                }
                Inline::Image { alt, url } => {
                    let _ = write!(
                        self.out,
                        "<img class=\"{}\" src=\"{}\" alt=\"{}\"/>",
                        self.class("img"),
                        escape(safe_url(url)),
                        escape(alt)
                    );
                }
            }
        }
    }
}

/// Render blocks, using resolved widgets where available
pub fn render_blocks(blocks: &[Block], widgets: Option<&Widgets>, options: &RenderOptions) -> String {
    let mut writer = HtmlWriter {
        out: String::new(),
        prefix: &options.class_prefix,
    };

    if options.wrap_container {
        let _ = write!(writer.out, "<div class=\"{}\">", writer.class("container"));
    }
    for (index, block) in blocks.iter().enumerate() {
        writer.block(index, block, widgets);
    }
    if options.wrap_container {
        writer.out.push_str("</div>");
    }
    writer.out
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Neutralize script-bearing URL schemes in agent-written links
fn safe_url(url: &str) -> &str {
    let lower = url.trim().to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:") {
        "#"
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::parse;

    fn bare() -> RenderOptions {
        RenderOptions {
            class_prefix: "x".to_string(),
            wrap_container: false,
        }
    }

    #[test]
    fn test_container_and_prefix() {
        let html = render_blocks(&parse("hello"), None, &RenderOptions::default());
        assert_eq!(html, "<div class=\"md-container\"><p class=\"md-p\">hello</p></div>");

        let html = render_blocks(&parse("hello"), None, &bare());
        assert_eq!(html, "<p class=\"x-p\">hello</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render_blocks(&parse("<b>hi</b> & `<tag>`"), None, &bare());
        assert_eq!(
            html,
            "<p class=\"x-p\">&lt;b&gt;hi&lt;/b&gt; &amp; <code class=\"x-inline-code\">&lt;tag&gt;</code></p>"
        );
    }

    #[test]
    fn test_script_links_are_neutralized() {
        let html = render_blocks(&parse("[x](javascript:alert(1))"), None, &bare());
        assert!(html.contains("href=\"#\""));
    }

    #[test]
    fn test_unresolved_resources_render_loading() {
        let html = render_blocks(&parse("<ag3ntum-file>a.txt</ag3ntum-file>"), None, &bare());
        assert_eq!(html, "<div class=\"x-file x-loading\">Loading a.txt…</div>");
    }

    #[test]
    fn test_attachments_are_rendered_sanitized() {
        let doc = "<ag3ntum-attached-file>[{\"name\":\"<img src=x onerror=alert(1)>a.txt\",\"size\":10}]</ag3ntum-attached-file>";
        let html = render_blocks(&parse(doc), None, &bare());
        assert!(html.contains("1 attached file"));
        assert!(html.contains("<span class=\"x-attachment-name\">a.txt</span>"));
        assert!(html.contains("<span class=\"x-attachment-size\">10 B</span>"));
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn test_table_and_list_markup() {
        let html = render_blocks(&parse("| A | B |\n|---|---|\n| **1** | 2 |\n  2. two"), None, &bare());
        assert!(html.starts_with("<table class=\"x-table\"><thead><tr><th>A</th><th>B</th></tr></thead>"));
        assert!(html.contains("<td><strong>1</strong></td>"));
        assert!(html.contains("style=\"padding-left: 16px\"><span class=\"x-marker\">2.</span> two</div>"));
    }
}
