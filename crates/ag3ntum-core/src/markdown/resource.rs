//! Resource tags embedded in agent output
//!
//! A resource tag occupies a whole line and names something in the session
//! workspace that the renderer turns into a live widget:
//!
//! ```text
//! <ag3ntum-file>PATH</ag3ntum-file>
//! <ag3ntum-image>PATH</ag3ntum-image>
//! <ag3ntum-attached-file>JSON_OR_LEGACY</ag3ntum-attached-file>
//! ```
//!
//! Attached-file payloads come from agent- or user-controlled upload
//! metadata, so every displayed field goes through [`sanitize_display_name`].

use crate::utils::format_size;
use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

pub const FILE_TAG: &str = "ag3ntum-file";
pub const IMAGE_TAG: &str = "ag3ntum-image";
pub const ATTACHED_FILE_TAG: &str = "ag3ntum-attached-file";

/// Longest displayed name, in characters
pub const MAX_DISPLAY_LEN: usize = 255;

const UNNAMED: &str = "unnamed";

static RESOURCE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<(ag3ntum-file|ag3ntum-image|ag3ntum-attached-file)>(.*)</(ag3ntum-file|ag3ntum-image|ag3ntum-attached-file)>$")
        .expect("valid resource tag regex")
});

static TAG_LIKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("valid tag regex"));

/// A recognized resource tag line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTag<'a> {
    File(&'a str),
    Image(&'a str),
    AttachedFile(&'a str),
}

/// Match a trimmed line that consists of exactly one resource tag
pub fn match_resource_line(line: &str) -> Option<ResourceTag<'_>> {
    let caps = RESOURCE_LINE_RE.captures(line)?;
    let open = caps.get(1)?.as_str();
    let close = caps.get(3)?.as_str();
    let body = caps.get(2)?.as_str();

    // A second tag on the same line means the line is not a single tag
    if open != close || body.contains("<ag3ntum-") || body.contains("</ag3ntum-") {
        return None;
    }

    let body = body.trim();
    match open {
        FILE_TAG if !body.is_empty() => Some(ResourceTag::File(body)),
        IMAGE_TAG if !body.is_empty() => Some(ResourceTag::Image(body)),
        ATTACHED_FILE_TAG => Some(ResourceTag::AttachedFile(body)),
        _ => None,
    }
}

/// One attachment shown by the attached-files widget; always sanitized
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttachedFileEntry {
    pub name: String,
    pub size: Option<u64>,
    pub size_formatted: Option<String>,
    pub mime_type: Option<String>,
    pub extension: Option<String>,
    pub last_modified: Option<String>,
}

impl AttachedFileEntry {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Sanitize every displayed field and fill derivable ones
    fn finish(mut self) -> Self {
        self.name = sanitize_display_name(&self.name);
        self.size_formatted = self
            .size_formatted
            .as_deref()
            .and_then(sanitize_optional)
            .or_else(|| self.size.map(format_size));
        self.mime_type = self.mime_type.as_deref().and_then(sanitize_optional);
        self.extension = self
            .extension
            .as_deref()
            .map(|ext| ext.trim_start_matches('.'))
            .and_then(sanitize_optional)
            .or_else(|| {
                self.name
                    .rsplit_once('.')
                    .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
                    .map(|(_, ext)| ext.to_ascii_lowercase())
            });
        self.last_modified = self.last_modified.as_deref().and_then(sanitize_optional);
        self
    }
}

/// Parse an attached-file payload.
///
/// JSON array first, then a single JSON object, then the legacy
/// `name|sizeDisplay` form, and finally the whole payload as one name.
pub fn parse_attached_files(payload: &str) -> Vec<AttachedFileEntry> {
    let payload = payload.trim();

    if payload.starts_with('[') || payload.starts_with('{') {
        match serde_json::from_str::<Value>(payload) {
            Ok(Value::Array(items)) => {
                return items
                    .iter()
                    .filter_map(entry_from_value)
                    .map(AttachedFileEntry::finish)
                    .collect();
            }
            Ok(value @ Value::Object(_)) => {
                if let Some(entry) = entry_from_value(&value) {
                    return vec![entry.finish()];
                }
            }
            Ok(_) => {}
            Err(e) => debug!("attached-file payload is not valid JSON: {}", e),
        }
    }

    if let Some((name, size)) = payload.split_once('|') {
        let entry = AttachedFileEntry {
            size_formatted: Some(size.trim().to_string()),
            ..AttachedFileEntry::named(name)
        };
        return vec![entry.finish()];
    }

    vec![AttachedFileEntry::named(payload).finish()]
}

fn entry_from_value(value: &Value) -> Option<AttachedFileEntry> {
    let obj = value.as_object()?;
    let field = |keys: &[&str]| keys.iter().find_map(|k| obj.get(*k));
    let text = |keys: &[&str]| {
        field(keys).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    let name = text(&["name", "filename", "fileName"])?;
    let size = field(&["size", "bytes"]).and_then(|v| match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    let last_modified = field(&["last_modified", "lastModified"]).and_then(|v| match v {
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(|ts| ts.to_rfc3339()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    });

    Some(AttachedFileEntry {
        name,
        size,
        size_formatted: text(&["size_formatted", "sizeFormatted", "size_display", "sizeDisplay"]),
        mime_type: text(&["mime_type", "mimeType", "type"]),
        extension: text(&["extension", "ext"]),
        last_modified,
    })
}

/// Make an untrusted name safe to display.
///
/// Control characters, tag-like substrings and path traversal sequences are
/// removed and the result is capped at [`MAX_DISPLAY_LEN`] characters. The
/// steps repeat until nothing changes, so applying it twice is the same as
/// applying it once.
pub fn sanitize_display_name(input: &str) -> String {
    let clean = sanitize_text(input);
    if clean.is_empty() {
        UNNAMED.to_string()
    } else {
        clean
    }
}

fn sanitize_optional(input: &str) -> Option<String> {
    Some(sanitize_text(input)).filter(|s| !s.is_empty())
}

fn sanitize_text(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_pass(input: &str) -> String {
    let no_control: String = input.chars().filter(|c| !c.is_control()).collect();
    let no_tags = TAG_LIKE_RE.replace_all(&no_control, "");
    let no_traversal = no_tags.replace("../", "").replace("..\\", "");
    let trimmed = no_traversal.trim();

    match trimmed.char_indices().nth(MAX_DISPLAY_LEN) {
        Some((idx, _)) => trimmed[..idx].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}
