use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\[\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}\] (?:IN|OUT|ERR): )(.+)$")
            .expect("static transcript pattern")
    })
}

/// Pretty-print the JSON payload of one transcript entry.
///
/// `line` may carry its line terminator. Entries whose payload is not JSON, and lines
/// that are not entries at all, come back unchanged.
pub fn format_line(line: &str) -> String {
    let body = line.strip_suffix('\n').unwrap_or(line);
    let body = body.strip_suffix('\r').unwrap_or(body);

    let Some(caps) = entry_pattern().captures(body) else {
        return line.to_string();
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&caps[2]) else {
        return line.to_string();
    };
    let Ok(pretty) = serde_json::to_string_pretty(&value) else {
        return line.to_string();
    };

    format!("{}{}\n", &caps[1], pretty.replace('\n', "\n  "))
}

pub fn format_transcript(input: &str) -> String {
    input.split_inclusive('\n').map(format_line).collect()
}

/// `<stem>_formatted<.ext>` next to `input`, or `None` when `input` has no extension.
pub fn default_output_path(input: &Path) -> Option<PathBuf> {
    let ext = input.extension()?.to_string_lossy();
    let stem = input.file_stem()?.to_string_lossy();
    Some(input.with_file_name(format!("{stem}_formatted.{ext}")))
}
