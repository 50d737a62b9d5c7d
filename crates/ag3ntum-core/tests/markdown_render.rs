//! End-to-end rendering of agent messages with resource tags.

mod common;

use ag3ntum_core::markdown::{
    self, parse, render_document, render_html, Block, FileWidget, RenderEnv, RenderOptions, Widget,
};
use ag3ntum_core::config::WidgetLimits;
use common::{MemoryWorkspace, SESSION};
use std::sync::Arc;

fn env(workspace: MemoryWorkspace) -> RenderEnv {
    RenderEnv::new(SESSION, Arc::new(workspace))
}

#[test]
fn parses_a_typical_agent_reply() {
    let reply = concat!(
        "## Summary\n",
        "I updated **two** files:\n",
        "\n",
        "1. `src/main.rs`\n",
        "2. [the docs](https://example.com/docs)\n",
        "\n",
        "<ag3ntum-file>./src/main.rs</ag3ntum-file>\n",
        "<ag3ntum-image>/workspace/out/chart.png</ag3ntum-image>\n",
        "---\n",
        "> Done.",
    );
    let blocks = parse(reply);

    let kinds: Vec<&str> = blocks
        .iter()
        .map(|b| match b {
            Block::Heading { .. } => "heading",
            Block::Paragraph(_) => "paragraph",
            Block::Spacer => "spacer",
            Block::ListItem { .. } => "item",
            Block::ResourceFile { .. } => "file",
            Block::ResourceImage { .. } => "image",
            Block::HorizontalRule => "rule",
            Block::Blockquote(_) => "quote",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["heading", "paragraph", "spacer", "item", "item", "spacer", "file", "image", "rule", "quote"]
    );
}

#[test]
fn attached_file_lines_group_by_entry_count() {
    let doc = concat!(
        "<ag3ntum-attached-file>[{\"name\":\"a.csv\",\"size\":2048},{\"name\":\"b.csv\"}]</ag3ntum-attached-file>\n",
        "<ag3ntum-attached-file>{\"name\":\"c.pdf\",\"mimeType\":\"application/pdf\"}</ag3ntum-attached-file>\n",
        "<ag3ntum-attached-file>notes.txt|1.2 KB</ag3ntum-attached-file>",
    );
    let blocks = parse(doc);
    assert_eq!(blocks.len(), 1);
    let Block::ResourceAttachedFiles { entries } = &blocks[0] else {
        panic!("expected one attachment group, got {:?}", blocks);
    };
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].size_formatted.as_deref(), Some("2.0 KB"));
    assert_eq!(entries[2].mime_type.as_deref(), Some("application/pdf"));
    assert_eq!(entries[3].name, "notes.txt");
    assert_eq!(entries[3].size_formatted.as_deref(), Some("1.2 KB"));
}

#[test]
fn render_html_without_environment_shows_placeholders() {
    let html = render_html(
        "# Report\n<ag3ntum-image>chart.png</ag3ntum-image>",
        &RenderOptions::default(),
    );
    assert_eq!(
        html,
        concat!(
            "<div class=\"md-container\">",
            "<h1 class=\"md-h1\">Report</h1>",
            "<div class=\"md-image md-loading\">Loading chart.png…</div>",
            "</div>"
        )
    );
}

#[tokio::test]
async fn render_document_resolves_widgets_independently() {
    let workspace = MemoryWorkspace::with_files(&[
        ("src/main.rs", "fn main() {\n    println!(\"hi\");\n}"),
        ("out/chart.png", "PNG"),
    ]);
    let doc = concat!(
        "<ag3ntum-file>./src/main.rs</ag3ntum-file>\n",
        "<ag3ntum-file>missing.rs</ag3ntum-file>\n",
        "<ag3ntum-image>/workspace/out/chart.png</ag3ntum-image>",
    );
    let options = RenderOptions {
        class_prefix: "msg".to_string(),
        wrap_container: false,
    };

    let html = render_document(doc, &env(workspace), &options).await;

    assert!(html.contains("<span class=\"msg-file-name\">main.rs</span>"));
    assert!(html.contains("println!(&quot;hi&quot;);"));
    assert!(html.contains("<div class=\"msg-file msg-error\">Failed to load missing.rs: HTTP 404"));
    assert!(html.contains("<img src=\"data:image/png;base64,UE5H\" alt=\"chart.png\"/>"));
}

#[tokio::test]
async fn long_files_collapse_until_expanded() {
    let body: String = (1..=40).map(|n| format!("row {}\n", n)).collect();
    let workspace = MemoryWorkspace::with_files(&[("log.txt", body.as_str())]);
    let env = env(workspace).with_limits(WidgetLimits {
        preview_lines: 5,
        max_lines: 30,
    });

    let blocks = parse("<ag3ntum-file>log.txt</ag3ntum-file>");
    let mut widgets = markdown::resolve_widgets(&blocks, &env).await;
    let options = RenderOptions::default();

    let collapsed = markdown::render_blocks(&blocks, Some(&widgets), &options);
    assert!(collapsed.contains("row 5</code>"));
    assert!(collapsed.contains("Show 25 more lines"));

    widgets.expand_all();
    let expanded = markdown::render_blocks(&blocks, Some(&widgets), &options);
    assert!(expanded.contains("row 30</code>"));
    assert!(!expanded.contains("row 31"));
    assert!(expanded.contains("Showing first 30 of 40 lines"));

    match widgets.get(0) {
        Some(Widget::File(FileWidget::Ready(preview))) => assert!(preview.exceeds_ceiling()),
        other => panic!("unexpected widget {:?}", other),
    }
}
