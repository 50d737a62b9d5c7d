//! Terminal rendering of parsed markdown

use ag3ntum_core::markdown::{
    pending_widget, AttachedFileEntry, Block, FilePreview, FileWidget, ImageWidget, Inline, ListMarker,
    Widget, Widgets,
};
use ag3ntum_core::utils::format_size;
use colored::Colorize;

/// Render blocks for a terminal, one output line per source line
pub fn render_blocks(blocks: &[Block], widgets: Option<&Widgets>) -> String {
    let mut lines = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        render_block(index, block, widgets, &mut lines);
    }
    lines.join("\n")
}

fn render_block(index: usize, block: &Block, widgets: Option<&Widgets>, out: &mut Vec<String>) {
    match block {
        Block::Heading { level, children } => {
            let text = inlines(children);
            out.push(match level {
                1 => text.bold().underline().to_string(),
                2 => text.bold().to_string(),
                _ => text.bold().dimmed().to_string(),
            });
        }
        Block::CodeBlock { language, code } => {
            if let Some(lang) = language {
                out.push(format!("  {}", lang.dimmed()));
            }
            for line in code.lines() {
                out.push(format!("  {}", line.cyan()));
            }
        }
        Block::Table { header, rows } => {
            let widths = column_widths(header, rows);
            out.push(table_row(header, &widths).bold().to_string());
            out.push(
                widths
                    .iter()
                    .map(|w| "─".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("─┼─"),
            );
            for row in rows {
                out.push(table_row(row, &widths));
            }
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
            out.push(format!("{}{} {}", " ".repeat(*indent), marker, inlines(children)));
        }
        Block::Blockquote(children) => {
            out.push(format!("{} {}", "│".dimmed(), inlines(children).italic()));
        }
        Block::HorizontalRule => out.push("─".repeat(40).dimmed().to_string()),
        Block::Paragraph(children) => out.push(inlines(children)),
        Block::Spacer => out.push(String::new()),
        Block::ResourceFile { .. } | Block::ResourceImage { .. } => {
            let resolved = widgets.and_then(|w| w.get(index)).cloned();
            match resolved.or_else(|| pending_widget(block)) {
                Some(Widget::File(widget)) => file_widget(&widget, out),
                Some(Widget::Image(widget)) => image_widget(&widget, out),
                None => {}
            }
        }
        Block::ResourceAttachedFiles { entries } => attachments(entries, out),
    }
}

fn file_widget(widget: &FileWidget, out: &mut Vec<String>) {
    match widget {
        FileWidget::Loading { path } => out.push(format!("📄 {} {}", path, "(not loaded)".dimmed())),
        FileWidget::Failed { path, message } => {
            out.push(format!("📄 {} {}", path, format!("failed: {}", message).red()))
        }
        FileWidget::Ready(preview) => file_preview(preview, out),
    }
}

fn file_preview(preview: &FilePreview, out: &mut Vec<String>) {
    out.push(format!(
        "📄 {} {}",
        preview.path.bold(),
        format_size(preview.size).dimmed()
    ));

    if preview.is_binary {
        out.push(format!("   {}", "binary file, preview not available".dimmed()));
    } else if preview.lines.is_empty() {
        out.push(format!("   {}", "(empty file)".dimmed()));
    } else {
        for (n, line) in preview.visible_lines().iter().enumerate() {
            out.push(format!("{:>4} │ {}", (n + 1).to_string().dimmed(), line));
        }
        if preview.can_expand() {
            out.push(format!(
                "   {}",
                format!("… {} more lines", preview.hidden_line_count()).dimmed()
            ));
        }
        if preview.expanded && preview.exceeds_ceiling() {
            out.push(format!(
                "   {}",
                format!(
                    "showing first {} of {} lines",
                    preview.limits.max_lines,
                    preview.lines.len()
                )
                .yellow()
            ));
        }
    }

    if preview.server_truncated {
        out.push(format!("   {}", "file truncated by server".yellow()));
    }
}

fn image_widget(widget: &ImageWidget, out: &mut Vec<String>) {
    match widget {
        ImageWidget::Loading { path } => out.push(format!("🖼  {} {}", path, "(not loaded)".dimmed())),
        ImageWidget::Failed { path, message } => {
            out.push(format!("🖼  {} {}", path, format!("failed: {}", message).red()))
        }
        ImageWidget::Ready {
            path,
            mime_type,
            data_uri,
        } => out.push(format!(
            "🖼  {} {}",
            path.bold(),
            format!("{}, {} chars inline", mime_type, data_uri.len()).dimmed()
        )),
    }
}

fn attachments(entries: &[AttachedFileEntry], out: &mut Vec<String>) {
    let label = match entries.len() {
        1 => "1 attached file".to_string(),
        n => format!("{} attached files", n),
    };
    out.push(format!("📎 {}", label.bold()));
    for entry in entries {
        let mut details = Vec::new();
        if let Some(ref size) = entry.size_formatted {
            details.push(size.clone());
        }
        if let Some(ref mime) = entry.mime_type {
            details.push(mime.clone());
        }
        if details.is_empty() {
            out.push(format!("   • {}", entry.name));
        } else {
            out.push(format!("   • {} {}", entry.name, details.join(", ").dimmed()));
        }
    }
}

fn inlines(nodes: &[Inline]) -> String {
    nodes
        .iter()
        .map(|node| match node {
            Inline::Text(text) => text.clone(),
            Inline::Bold(children) => inlines(children).bold().to_string(),
            Inline::Italic(text) => text.italic().to_string(),
            Inline::Code(text) => text.cyan().to_string(),
            Inline::Link { text, url } => format!("{} ({})", text.underline(), url.dimmed()),
            Inline::Image { alt, url } => format!("[image: {}] ({})", alt, url.dimmed()),
        })
        .collect()
}

fn column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
    (0..columns)
        .map(|i| {
            std::iter::once(header)
                .chain(rows.iter().map(Vec::as_slice))
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn table_row(cells: &[String], widths: &[usize]) -> String {
    widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{:<width$}", cell, width = width)
        })
        .collect::<Vec<_>>()
        .join(" │ ")
}
